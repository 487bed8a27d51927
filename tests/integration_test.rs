use assert_cmd::Command;
use assert_cmd::cargo;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockito::Server;
use predicates::prelude::*;
use sha2::{Digest, Sha256};
use std::io::prelude::*;
use std::path::Path;
use tar::Builder;
use tempfile::tempdir;

const GODWIT_MACOS_URL: &str = "https://github.com/Passeriform/GodWit/releases/download/0.1.1/GodWit-0.1.1-x86_64-apple-darwin.tar.gz";
const ASSET_PATH: &str = "/tool/releases/download/1.2.3/tool-1.2.3-x86_64-unknown-linux.tar.gz";

fn create_tar_gz_with_executable(files: &[(&str, &str, u32)]) -> Vec<u8> {
    let mut tar_builder = Builder::new(Vec::new());
    for (name, content, mode) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_path(name).unwrap();
        header.set_mode(*mode);
        header.set_cksum();
        tar_builder.append(&header, content.as_bytes()).unwrap();
    }
    let tar = tar_builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

fn tool_archive() -> Vec<u8> {
    create_tar_gz_with_executable(&[
        ("tool-1.2.3/tool", "#!/bin/sh\necho tool\n", 0o755),
        ("tool-1.2.3/docs/tool.1", ".TH TOOL 1\n", 0o644),
        ("tool-1.2.3/completions/tool.bash", "complete -F _tool tool\n", 0o644),
    ])
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Write a manifest for `tool` 1.2.3 hosted under `base_url`.
fn write_manifest(dir: &Path, base_url: &str, sha256: &str, conflicts_with: &[&str]) -> std::path::PathBuf {
    let conflicts: Vec<String> = conflicts_with.iter().map(|c| format!("\"{}\"", c)).collect();
    let path = dir.join(format!("tool-{}.json", conflicts_with.len()));
    std::fs::write(
        &path,
        format!(
            r#"{{
                "name": "tool",
                "version": "1.2.3",
                "base_url": "{}",
                "sha256": {{ "linux-x86_64": "{}" }},
                "conflicts_with": [{}],
                "artifacts": [
                    {{ "path": "tool", "category": "executable" }},
                    {{ "path": "docs/tool.1", "category": {{ "manual_page": 1 }} }},
                    {{ "path": "completions/tool.bash", "category": {{ "shell_completion": "bash" }} }}
                ]
            }}"#,
            base_url,
            sha256,
            conflicts.join(", ")
        ),
    )
    .unwrap();
    path
}

fn relinst() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("relinst"));
    cmd.env_remove("RELINST_PREFIX").env_remove("RELINST_MANIFEST");
    cmd
}

#[test]
fn test_locate_macos_asset() {
    relinst()
        .args(["locate", "--os", "macos", "--arch", "x86_64"])
        .assert()
        .success()
        .stdout(predicate::str::contains(GODWIT_MACOS_URL))
        .stdout(predicate::str::contains(
            "974351ca7d00083ba2fad52e2f2539c8ff114119c139420f592507962ab43b75",
        ));
}

#[test]
fn test_locate_linux_asset() {
    relinst()
        .args(["locate", "--os", "Linux", "--arch", "amd64"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GodWit-0.1.1-x86_64-unknown-linux.tar.gz"));
}

#[test]
fn test_locate_windows_is_unsupported() {
    relinst()
        .args(["locate", "--os", "windows", "--arch", "x86_64"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("error[UnsupportedPlatform]"));
}

#[test]
fn test_locate_without_digest_entry() {
    relinst()
        .args(["locate", "--os", "linux", "--arch", "aarch64"])
        .assert()
        .code(11)
        .stderr(predicate::str::contains("error[MissingDigestEntry]"));
}

#[test]
fn test_verify_local_archive() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("tool.tar.gz");
    std::fs::write(&archive, b"archive bytes").unwrap();

    relinst()
        .arg("verify")
        .arg(&archive)
        .arg("--sha256")
        .arg(sha256_hex(b"archive bytes"))
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));

    relinst()
        .arg("verify")
        .arg(&archive)
        .arg("--sha256")
        .arg(sha256_hex(b"other bytes"))
        .assert()
        .code(13)
        .stderr(predicate::str::contains("error[DigestMismatch]"));
}

#[test]
fn test_verify_against_manifest_digest() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("GodWit.tar.gz");
    std::fs::write(&archive, b"not the real release").unwrap();

    relinst()
        .arg("verify")
        .arg(&archive)
        .args(["--os", "macos", "--arch", "x86_64"])
        .assert()
        .code(13)
        .stderr(predicate::str::contains(
            "expected 974351ca7d00083ba2fad52e2f2539c8ff114119c139420f592507962ab43b75",
        ));
}

#[test]
fn test_info_shows_builtin_manifest() {
    relinst()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Package: GodWit"))
        .stdout(predicate::str::contains("Version: 0.1.1"))
        .stdout(predicate::str::contains("darwin-x86_64"))
        .stdout(predicate::str::contains("Conflicts with: godwit"));
}

#[test]
fn test_info_with_invalid_manifest() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("broken.json");
    std::fs::write(&manifest, "{ not json").unwrap();

    relinst()
        .arg("--manifest")
        .arg(&manifest)
        .arg("info")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid manifest"));
}

#[test]
fn test_end_to_end_install() {
    let mut server = Server::new();
    let archive = tool_archive();
    let mock_download = server
        .mock("GET", ASSET_PATH)
        .with_status(200)
        .with_body(&archive)
        .expect(1)
        .create();

    let work = tempdir().unwrap();
    let prefix = tempdir().unwrap();
    let manifest = write_manifest(work.path(), &server.url(), &sha256_hex(&archive), &[]);

    relinst()
        .arg("--manifest")
        .arg(&manifest)
        .arg("--prefix")
        .arg(prefix.path())
        .args(["install", "--os", "linux", "--arch", "x86_64"])
        .assert()
        .success();

    mock_download.assert();

    let p = prefix.path();
    assert_eq!(
        std::fs::read_to_string(p.join("bin/tool")).unwrap(),
        "#!/bin/sh\necho tool\n"
    );
    assert!(p.join("share/man/man1/tool.1").exists());
    assert!(p.join("etc/bash_completion.d/tool.bash").exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(p.join("bin/tool"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    let receipt = std::fs::read_to_string(p.join("var/relinst/receipts/tool.json")).unwrap();
    assert!(receipt.contains("\"version\": \"1.2.3\""));
    assert!(receipt.contains("linux-x86_64"));
}

#[test]
fn test_install_conflicts_with_recorded_package() {
    let mut server = Server::new();
    let archive = tool_archive();
    let _mock_download = server
        .mock("GET", ASSET_PATH)
        .with_status(200)
        .with_body(&archive)
        .create();

    let work = tempdir().unwrap();
    let prefix = tempdir().unwrap();
    let receipts = prefix.path().join("var/relinst/receipts");
    std::fs::create_dir_all(&receipts).unwrap();
    std::fs::write(receipts.join("legacy-tool.json"), "{}").unwrap();

    let manifest = write_manifest(
        work.path(),
        &server.url(),
        &sha256_hex(&archive),
        &["legacy-tool"],
    );

    relinst()
        .arg("--manifest")
        .arg(&manifest)
        .arg("--prefix")
        .arg(prefix.path())
        .args(["install", "--os", "linux", "--arch", "x86_64"])
        .assert()
        .code(14)
        .stderr(predicate::str::contains("error[ConflictDetected]"))
        .stderr(predicate::str::contains("legacy-tool"));

    assert!(!prefix.path().join("bin").exists());
}

#[test]
fn test_install_rejects_tampered_download() {
    let mut server = Server::new();
    let archive = tool_archive();
    let _mock_download = server
        .mock("GET", ASSET_PATH)
        .with_status(200)
        .with_body(b"tampered archive")
        .create();

    let work = tempdir().unwrap();
    let prefix = tempdir().unwrap();
    let manifest = write_manifest(work.path(), &server.url(), &sha256_hex(&archive), &[]);

    relinst()
        .arg("--manifest")
        .arg(&manifest)
        .arg("--prefix")
        .arg(prefix.path())
        .args(["install", "--os", "linux", "--arch", "x86_64"])
        .assert()
        .code(13);

    assert!(!prefix.path().join("bin").exists());
    assert!(!prefix.path().join("var").exists());
}

#[test]
fn test_install_missing_release_is_download_error() {
    let mut server = Server::new();
    let _mock_download = server.mock("GET", ASSET_PATH).with_status(404).create();

    let work = tempdir().unwrap();
    let manifest = write_manifest(work.path(), &server.url(), &sha256_hex(b"x"), &[]);
    let prefix = tempdir().unwrap();

    relinst()
        .env("RELINST_MANIFEST", &manifest)
        .env("RELINST_PREFIX", prefix.path())
        .args(["install", "--os", "linux", "--arch", "x86_64"])
        .assert()
        .code(12)
        .stderr(predicate::str::contains("error[Download]"));
}

#[test]
fn test_install_dry_run_prints_url_only() {
    let prefix = tempdir().unwrap();

    relinst()
        .arg("--prefix")
        .arg(prefix.path())
        .args(["install", "--os", "macos", "--arch", "x86_64", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(GODWIT_MACOS_URL));

    assert_eq!(std::fs::read_dir(prefix.path()).unwrap().count(), 0);
}
