//! Install receipts.
//!
//! A receipt is written once a package reaches the installed state. Its
//! presence is what [`crate::conflict::ReceiptRegistry`] reports as
//! "installed".

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Record of one successful installation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Receipt {
    pub name: String,
    pub package: String,
    pub version: String,
    pub triple: String,
    pub sha256: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// Receipt location for a package name: `<dir>/<name>.json`.
pub fn receipt_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", name.to_ascii_lowercase()))
}

impl Receipt {
    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, dir: &Path) -> Result<PathBuf> {
        runtime
            .create_dir_all(dir)
            .with_context(|| format!("Failed to create receipt directory {:?}", dir))?;
        let path = receipt_path(dir, &self.name);
        let json = serde_json::to_string_pretty(self).context("Failed to serialize receipt")?;
        let tmp_path = path.with_extension("json.tmp");
        runtime.write(&tmp_path, json.as_bytes())?;
        runtime.rename(&tmp_path, &path)?;
        Ok(path)
    }

    pub fn load<R: Runtime>(runtime: &R, dir: &Path, name: &str) -> Result<Option<Self>> {
        let path = receipt_path(dir, name);
        if !runtime.exists(&path) {
            return Ok(None);
        }
        let content = runtime.read_to_string(&path)?;
        let receipt = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse receipt {:?}", path))?;
        Ok(Some(receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use tempfile::tempdir;

    fn sample() -> Receipt {
        Receipt {
            name: "godwit-bin".into(),
            package: "GodWit".into(),
            version: "0.1.1".into(),
            triple: "linux-x86_64".into(),
            sha256: "c6bba6d643b1a1f18994683e26d4d2b998b41a7a7360e63cb8ec9db8ffbf793c".into(),
            files: vec![PathBuf::from("/usr/local/bin/godwit")],
        }
    }

    #[test]
    fn test_receipt_path_lowercases() {
        assert_eq!(
            receipt_path(Path::new("/r"), "GodWit"),
            PathBuf::from("/r/godwit.json")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let receipts = dir.path().join("var/relinst/receipts");
        let runtime = RealRuntime;

        let path = sample().save(&runtime, &receipts).unwrap();
        assert_eq!(path, receipts.join("godwit-bin.json"));
        assert!(!receipts.join("godwit-bin.json.tmp").exists());

        let loaded = Receipt::load(&runtime, &receipts, "godwit-bin").unwrap();
        assert_eq!(loaded, Some(sample()));
    }

    #[test]
    fn test_load_absent() {
        let dir = tempdir().unwrap();
        let loaded = Receipt::load(&RealRuntime, dir.path(), "godwit").unwrap();
        assert!(loaded.is_none());
    }
}
