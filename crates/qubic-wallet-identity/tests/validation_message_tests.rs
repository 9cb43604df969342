//! Integration tests for user-facing validation messages and field state.

use qubic_wallet_identity::{
    ValidationClass, css_class, dest_css_class, validate, validate_destination,
};

const ZERO_KEY_IDENTITY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAFXIB";

#[test]
fn validation_message_tests_renders_exact_messages() {
    let message = |raw: &str| validate(raw).map(|issue| issue.to_string());

    assert_eq!(
        message("ABC").as_deref(),
        Some("Must be 60 characters (3 entered)")
    );

    let with_digit = format!("{}7", &ZERO_KEY_IDENTITY[..59]);
    assert_eq!(message(&with_digit).as_deref(), Some("Must be uppercase A-Z only"));

    let bad_checksum = ZERO_KEY_IDENTITY.replace("FXIB", "AAAA");
    assert_eq!(message(&bad_checksum).as_deref(), Some("Invalid checksum"));
}

#[test]
fn validation_message_tests_length_error_counts_every_length() {
    for length in (1..=120).filter(|length| *length != 60) {
        let value: String = std::iter::repeat_n('Q', length).collect();
        assert_eq!(
            validate(&value).map(|issue| issue.to_string()),
            Some(format!("Must be 60 characters ({length} entered)"))
        );
    }
}

#[test]
fn validation_message_tests_destination_range() {
    for index in 0..=23 {
        assert_eq!(validate_destination(&index.to_string()), None);
    }
    for index in [-1_i64, 24, 100, -4_000_000_000, i64::MAX] {
        assert_eq!(
            validate_destination(&index.to_string()).map(|issue| issue.to_string()),
            Some("Contract index must be 0-23".to_string())
        );
    }
    assert_eq!(
        validate_destination("123456789012345678901234567890")
            .map(|issue| issue.to_string())
            .as_deref(),
        Some("Contract index must be 0-23")
    );
}

#[test]
fn validation_message_tests_destination_falls_back_to_identity() {
    assert_eq!(validate_destination(ZERO_KEY_IDENTITY), None);
    assert_eq!(
        validate_destination("NOTANUMBER").map(|issue| issue.to_string()),
        Some("Must be 60 characters (10 entered)".to_string())
    );
}

#[test]
fn validation_message_tests_field_state_waits_for_full_length() {
    assert_eq!(css_class(""), ValidationClass::Pending);
    assert_eq!(css_class("   "), ValidationClass::Pending);
    assert_eq!(css_class(&ZERO_KEY_IDENTITY[..59]), ValidationClass::Pending);
    assert_eq!(css_class("!!garbage!!"), ValidationClass::Pending);
    assert_eq!(css_class(ZERO_KEY_IDENTITY), ValidationClass::Valid);

    let bad_checksum = ZERO_KEY_IDENTITY.replace("FXIB", "AAAA");
    assert_eq!(css_class(&bad_checksum), ValidationClass::Invalid);
    assert_eq!(css_class(&format!("{ZERO_KEY_IDENTITY}A")), ValidationClass::Invalid);
}

#[test]
fn validation_message_tests_destination_field_state() {
    assert_eq!(dest_css_class(""), ValidationClass::Pending);
    assert_eq!(dest_css_class("0"), ValidationClass::Valid);
    assert_eq!(dest_css_class("23"), ValidationClass::Valid);
    assert_eq!(dest_css_class("24"), ValidationClass::Invalid);
    assert_eq!(dest_css_class("AAAA"), ValidationClass::Pending);
    assert_eq!(dest_css_class(ZERO_KEY_IDENTITY), ValidationClass::Valid);
}
