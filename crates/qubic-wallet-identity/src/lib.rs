#![warn(missing_docs)]
//! # qubic-wallet-identity
//!
//! ## Purpose
//! Validates account identifiers and transfer destinations typed into the
//! wallet UI.
//!
//! ## Responsibilities
//! - Check the 60-letter identity format and its embedded checksum.
//! - Accept small contract slot indices (`0..=23`) as destinations.
//! - Project validation results into incremental CSS state for input fields.
//! - Encode and decode identities from 32-byte public keys.
//!
//! ## Data flow
//! UI input field -> [`validate`] / [`validate_destination`] -> optional
//! [`ValidationIssue`] rendered next to the field, and [`css_class`] /
//! [`dest_css_class`] -> field styling.
//!
//! ## Ownership and lifetimes
//! All functions borrow the raw input and never mutate it; only a trimmed
//! view is inspected.
//!
//! ## Error model
//! Validation never fails: problems are returned as [`ValidationIssue`]
//! values. The codec reports decoding failures as [`IdentityError`].
//!
//! ## Example
//! ```rust
//! use qubic_wallet_identity::{validate, validate_destination, ValidationIssue};
//!
//! assert_eq!(validate("   "), None);
//! assert_eq!(validate("ABC"), Some(ValidationIssue::WrongLength(3)));
//! assert_eq!(validate_destination("7"), None);
//! ```

use k12::KangarooTwelve;
use k12::digest::{ExtendableOutput, Update, XofReader};
use thiserror::Error;

/// Exact character count of a full identity.
pub const IDENTITY_LEN: usize = 60;

/// Highest contract slot index accepted as a destination.
pub const MAX_CONTRACT_INDEX: i64 = 23;

/// Public key length encoded by an identity.
pub const PUBLIC_KEY_LEN: usize = 32;

const KEY_WORDS: usize = 4;
const WORD_LETTERS: usize = 14;
const BODY_LETTERS: usize = 56;
const CHECKSUM_LETTERS: usize = 4;
const CHECKSUM_MASK: u32 = 0x3FFFF;

/// Raw 32-byte public key behind an identity.
pub type PublicKey = [u8; PUBLIC_KEY_LEN];

/// Diagnostic produced by identity and destination validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// Trimmed input does not have exactly 60 characters.
    #[error("Must be 60 characters ({0} entered)")]
    WrongLength(usize),
    /// Input contains characters outside `A-Z`.
    #[error("Must be uppercase A-Z only")]
    NotUppercaseAlpha,
    /// Format is correct but the embedded checksum does not verify.
    #[error("Invalid checksum")]
    InvalidChecksum,
    /// Numeric destination outside the contract slot range.
    #[error("Contract index must be 0-23")]
    ContractIndexOutOfRange,
}

/// Validation state projected onto an input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationClass {
    /// Nothing to show yet (empty or still being typed).
    Pending,
    /// Input validated.
    Valid,
    /// Input failed validation.
    Invalid,
}

impl ValidationClass {
    /// Returns the CSS class token applied to the input element.
    pub fn css_token(self) -> &'static str {
        match self {
            Self::Pending => "",
            Self::Valid => "is-valid",
            Self::Invalid => "is-invalid",
        }
    }

    fn from_issue(issue: Option<ValidationIssue>) -> Self {
        if issue.is_none() {
            Self::Valid
        } else {
            Self::Invalid
        }
    }
}

/// Capability verifying the checksum of a well-formed 60-letter identity.
pub trait ChecksumVerifier {
    /// Returns `true` when `identity` carries a valid checksum.
    fn verify(&self, identity: &str) -> bool;
}

/// Default verifier backed by [`public_key_from_identity`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QubicChecksum;

impl ChecksumVerifier for QubicChecksum {
    fn verify(&self, identity: &str) -> bool {
        public_key_from_identity(identity).is_ok()
    }
}

/// Identity validator parameterised over its checksum capability.
#[derive(Debug, Clone, Default)]
pub struct IdentityValidator<V = QubicChecksum> {
    verifier: V,
}

impl<V: ChecksumVerifier> IdentityValidator<V> {
    /// Creates a validator using `verifier` for checksum checks.
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    /// Validates a full identity.
    ///
    /// Blank input is treated as "not filled yet" and yields `None`.
    /// Format (length, then alphabet) is checked before the checksum.
    pub fn validate(&self, raw: &str) -> Option<ValidationIssue> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        let length = value.chars().count();
        if length != IDENTITY_LEN {
            return Some(ValidationIssue::WrongLength(length));
        }

        if !value.to_uppercase().chars().all(|c| c.is_ascii_uppercase()) {
            return Some(ValidationIssue::NotUppercaseAlpha);
        }

        if !self.verifier.verify(value) {
            return Some(ValidationIssue::InvalidChecksum);
        }

        None
    }

    /// Validates a destination: either a contract slot index or an identity.
    pub fn validate_destination(&self, raw: &str) -> Option<ValidationIssue> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        match parse_contract_slot(value) {
            Some(ContractSlot::InRange(_)) => None,
            Some(ContractSlot::OutOfRange) => Some(ValidationIssue::ContractIndexOutOfRange),
            None => self.validate(value),
        }
    }

    /// Field state for an identity input.
    ///
    /// Stays [`ValidationClass::Pending`] until 60 characters are present so
    /// partially typed identities are not flagged.
    pub fn css_class(&self, raw: &str) -> ValidationClass {
        let value = raw.trim();
        if value.is_empty() || value.chars().count() < IDENTITY_LEN {
            return ValidationClass::Pending;
        }
        ValidationClass::from_issue(self.validate(value))
    }

    /// Field state for a destination input.
    ///
    /// Numeric input is classified immediately; identity input follows the
    /// same length threshold as [`IdentityValidator::css_class`].
    pub fn dest_css_class(&self, raw: &str) -> ValidationClass {
        let value = raw.trim();
        if value.is_empty() {
            return ValidationClass::Pending;
        }
        if parse_contract_slot(value).is_some() {
            return ValidationClass::from_issue(self.validate_destination(value));
        }
        if value.chars().count() < IDENTITY_LEN {
            return ValidationClass::Pending;
        }
        ValidationClass::from_issue(self.validate_destination(value))
    }
}

/// Validates an identity with the default checksum verifier.
pub fn validate(raw: &str) -> Option<ValidationIssue> {
    IdentityValidator::<QubicChecksum>::default().validate(raw)
}

/// Validates a destination with the default checksum verifier.
pub fn validate_destination(raw: &str) -> Option<ValidationIssue> {
    IdentityValidator::<QubicChecksum>::default().validate_destination(raw)
}

/// Identity field state with the default checksum verifier.
pub fn css_class(raw: &str) -> ValidationClass {
    IdentityValidator::<QubicChecksum>::default().css_class(raw)
}

/// Destination field state with the default checksum verifier.
pub fn dest_css_class(raw: &str) -> ValidationClass {
    IdentityValidator::<QubicChecksum>::default().dest_css_class(raw)
}

/// Outcome of reading a destination as a contract slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractSlot {
    /// Integer within `0..=23`.
    InRange(u8),
    /// Integer syntax but outside the slot range, including values too wide
    /// for any machine integer.
    OutOfRange,
}

/// Reads `value` as a contract slot when it has integer syntax
/// (`[+-]?[0-9]+`). Returns `None` for anything else.
pub fn parse_contract_slot(value: &str) -> Option<ContractSlot> {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let slot = match value.parse::<i64>() {
        Ok(index) if (0..=MAX_CONTRACT_INDEX).contains(&index) => {
            ContractSlot::InRange(index as u8)
        }
        _ => ContractSlot::OutOfRange,
    };
    Some(slot)
}

/// Errors produced while decoding an identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Identity is not exactly 60 characters.
    #[error("identity must be {IDENTITY_LEN} characters, got {0}")]
    Length(usize),
    /// Identity contains characters outside `A-Z`.
    #[error("identity must contain only uppercase letters")]
    Alphabet,
    /// A 14-letter group encodes a value wider than 64 bits.
    #[error("identity group {0} overflows a 64-bit word")]
    WordOverflow(usize),
    /// Trailing checksum letters do not match the public key.
    #[error("identity checksum mismatch")]
    ChecksumMismatch,
}

/// Encodes a public key as a 60-letter identity.
pub fn identity_from_public_key(public_key: &PublicKey) -> String {
    let mut identity = String::with_capacity(IDENTITY_LEN);
    for mut word in key_words(public_key) {
        for _ in 0..WORD_LETTERS {
            identity.push(char::from(b'A' + (word % 26) as u8));
            word /= 26;
        }
    }
    for letter in checksum_letters(public_key) {
        identity.push(char::from(letter));
    }
    identity
}

/// Decodes an identity into its public key, verifying the checksum.
///
/// # Errors
/// Returns [`IdentityError`] for wrong length, characters outside `A-Z`,
/// groups overflowing 64 bits, or a checksum mismatch.
pub fn public_key_from_identity(identity: &str) -> Result<PublicKey, IdentityError> {
    let letters = identity.as_bytes();
    if letters.len() != IDENTITY_LEN {
        return Err(IdentityError::Length(identity.chars().count()));
    }
    if !letters.iter().all(u8::is_ascii_uppercase) {
        return Err(IdentityError::Alphabet);
    }

    let mut public_key = [0u8; PUBLIC_KEY_LEN];
    for (group, chunk) in letters[..BODY_LETTERS].chunks_exact(WORD_LETTERS).enumerate() {
        let mut word: u64 = 0;
        for &letter in chunk.iter().rev() {
            word = word
                .checked_mul(26)
                .and_then(|value| value.checked_add(u64::from(letter - b'A')))
                .ok_or(IdentityError::WordOverflow(group))?;
        }
        public_key[group * 8..(group + 1) * 8].copy_from_slice(&word.to_le_bytes());
    }

    if letters[BODY_LETTERS..] != checksum_letters(&public_key) {
        return Err(IdentityError::ChecksumMismatch);
    }

    Ok(public_key)
}

/// Splits the key into four little-endian 64-bit words.
fn key_words(public_key: &PublicKey) -> [u64; KEY_WORDS] {
    std::array::from_fn(|word| {
        u64::from_le_bytes(std::array::from_fn(|byte| public_key[word * 8 + byte]))
    })
}

/// 18-bit KangarooTwelve checksum of the key, as four base-26 letters.
fn checksum_letters(public_key: &PublicKey) -> [u8; CHECKSUM_LETTERS] {
    let mut digest = [0u8; 3];
    let mut hasher = KangarooTwelve::default();
    hasher.update(public_key);
    let mut reader = hasher.finalize_xof();
    reader.read(&mut digest);

    let mut checksum =
        (u32::from(digest[0]) | u32::from(digest[1]) << 8 | u32::from(digest[2]) << 16)
            & CHECKSUM_MASK;
    let mut letters = [0u8; CHECKSUM_LETTERS];
    for letter in &mut letters {
        *letter = b'A' + (checksum % 26) as u8;
        checksum /= 26;
    }
    letters
}

#[cfg(test)]
mod tests {
    //! Unit tests for validation ordering and field state.

    use super::*;

    struct AcceptAll;

    impl ChecksumVerifier for AcceptAll {
        fn verify(&self, _identity: &str) -> bool {
            true
        }
    }

    struct RejectAll;

    impl ChecksumVerifier for RejectAll {
        fn verify(&self, _identity: &str) -> bool {
            false
        }
    }

    fn sixty(fill: char) -> String {
        std::iter::repeat_n(fill, IDENTITY_LEN).collect()
    }

    #[test]
    fn blank_input_is_not_an_error() {
        let validator = IdentityValidator::new(RejectAll);
        assert_eq!(validator.validate(""), None);
        assert_eq!(validator.validate(" \t\n"), None);
        assert_eq!(validator.validate_destination("   "), None);
    }

    #[test]
    fn length_is_reported_after_trimming() {
        let validator = IdentityValidator::new(AcceptAll);
        assert_eq!(
            validator.validate("  ABCDE  "),
            Some(ValidationIssue::WrongLength(5))
        );
        let long: String = std::iter::repeat_n('A', 61).collect();
        assert_eq!(
            validator.validate(&long),
            Some(ValidationIssue::WrongLength(61))
        );
    }

    #[test]
    fn format_is_checked_before_checksum() {
        let validator = IdentityValidator::new(AcceptAll);
        let mut value = sixty('A');
        value.replace_range(10..11, "1");
        assert_eq!(
            validator.validate(&value),
            Some(ValidationIssue::NotUppercaseAlpha)
        );
    }

    #[test]
    fn lowercase_letters_pass_format_and_reach_checksum() {
        let validator = IdentityValidator::new(RejectAll);
        assert_eq!(
            validator.validate(&sixty('a')),
            Some(ValidationIssue::InvalidChecksum)
        );
    }

    #[test]
    fn checksum_result_decides_well_formed_input() {
        assert_eq!(IdentityValidator::new(AcceptAll).validate(&sixty('B')), None);
        assert_eq!(
            IdentityValidator::new(RejectAll).validate(&sixty('B')),
            Some(ValidationIssue::InvalidChecksum)
        );
    }

    #[test]
    fn key_words_are_little_endian_per_group() {
        let mut key = [0u8; PUBLIC_KEY_LEN];
        key[0] = 0x01;
        key[15] = 0x02;
        key[31] = 0x80;
        assert_eq!(key_words(&key), [1_u64, 0x02_u64 << 56, 0, 0x80_u64 << 56]);

        let encoded = identity_from_public_key(&key);
        assert_eq!(public_key_from_identity(&encoded), Ok(key));
    }

    #[test]
    fn contract_slot_parsing_handles_signs_and_width() {
        assert_eq!(parse_contract_slot("0"), Some(ContractSlot::InRange(0)));
        assert_eq!(parse_contract_slot("+23"), Some(ContractSlot::InRange(23)));
        assert_eq!(parse_contract_slot("-1"), Some(ContractSlot::OutOfRange));
        assert_eq!(
            parse_contract_slot("99999999999999999999999999"),
            Some(ContractSlot::OutOfRange)
        );
        assert_eq!(parse_contract_slot("12a"), None);
        assert_eq!(parse_contract_slot("-"), None);
    }

    #[test]
    fn destination_css_prefers_numeric_classification() {
        let validator = IdentityValidator::new(AcceptAll);
        assert_eq!(validator.dest_css_class("5"), ValidationClass::Valid);
        assert_eq!(validator.dest_css_class("24"), ValidationClass::Invalid);
        assert_eq!(validator.dest_css_class("ABC"), ValidationClass::Pending);
        assert_eq!(validator.css_class("24"), ValidationClass::Pending);
    }

    #[test]
    fn css_tokens_match_bootstrap_names() {
        assert_eq!(ValidationClass::Pending.css_token(), "");
        assert_eq!(ValidationClass::Valid.css_token(), "is-valid");
        assert_eq!(ValidationClass::Invalid.css_token(), "is-invalid");
    }
}
