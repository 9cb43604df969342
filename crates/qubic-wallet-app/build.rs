use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let workspace_root = manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf();
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("out dir"));

    let version_path = workspace_root.join("VERSION");
    println!("cargo:rerun-if-changed={}", version_path.display());

    let raw_version = fs::read_to_string(&version_path).expect("read VERSION file");
    let version = raw_version.trim();
    assert!(
        !version.is_empty(),
        "VERSION file must contain non-empty version"
    );
    println!("cargo:rustc-env=QUBIC_WALLET_VERSION={version}");

    println!("cargo:rustc-check-cfg=cfg(embedded_assets)");
    println!("cargo:rustc-check-cfg=cfg(embedded_icon)");

    let mut build_id = Sha256::new();
    build_id.update(version.as_bytes());

    let assets_dir = workspace_root.join("assets");
    println!("cargo:rerun-if-changed={}", assets_dir.display());

    if std::env::var_os("CARGO_FEATURE_EMBED_ASSETS").is_some() {
        let wwwroot = assets_dir.join("wwwroot");
        if wwwroot.is_dir() {
            let archive = pack_directory(&wwwroot);
            build_id.update(&archive);
            fs::write(out_dir.join("wwwroot.zip"), &archive).expect("write embedded archive");
            println!("cargo:rustc-cfg=embedded_assets");
        }

        let icon = assets_dir.join("icon.ico");
        if icon.is_file() {
            fs::copy(&icon, out_dir.join("icon.ico")).expect("copy embedded icon");
            println!("cargo:rustc-cfg=embedded_icon");
        }
    }

    println!(
        "cargo:rustc-env=QUBIC_WALLET_BUILD_ID={}",
        hex::encode(build_id.finalize())
    );
}

/// Zips `root` with sorted entries and fixed timestamps so identical inputs
/// produce identical archives (and build ids).
fn pack_directory(root: &Path) -> Vec<u8> {
    let files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for path in files {
        println!("cargo:rerun-if-changed={}", path.display());
        let relative = path.strip_prefix(root).expect("walked path under root");
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        writer.start_file(name, options).expect("start archive entry");
        let contents = fs::read(&path).expect("read asset file");
        writer.write_all(&contents).expect("write archive entry");
    }

    writer.finish().expect("finish archive").into_inner()
}
