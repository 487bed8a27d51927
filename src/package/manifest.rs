use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::artifact::{InstallCategory, MAN_SECTIONS};
use crate::error::ManifestError;
use crate::platform::TargetTriple;
use crate::release::DigestTable;
use crate::runtime::Runtime;
use crate::verify::Sha256Hash;

use super::PackageDescriptor;
use super::descriptor::validate_name;

const BUILTIN_MANIFEST: &str = include_str!("../../manifests/godwit-bin.json");

/// A file the release archive is expected to contain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArtifactEntry {
    /// Path relative to the archive content root.
    pub path: String,
    pub category: InstallCategory,
}

/// On-disk layout of a manifest, before validation.
#[derive(Deserialize, Debug)]
struct RawManifest {
    name: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    base_url: String,
    #[serde(default)]
    sha256: BTreeMap<String, String>,
    #[serde(default)]
    conflicts_with: BTreeSet<String>,
    #[serde(default)]
    artifacts: Vec<ArtifactEntry>,
    #[serde(default)]
    receipt_name: Option<String>,
}

/// Declarative description of one package release.
#[derive(Debug, Clone)]
pub struct Manifest {
    descriptor: PackageDescriptor,
    pub description: Option<String>,
    pub homepage: Option<String>,
    /// Hosting root, e.g. `https://github.com/Passeriform`.
    pub base_url: String,
    pub digests: DigestTable,
    pub conflicts_with: BTreeSet<String>,
    pub artifacts: Vec<ArtifactEntry>,
    receipt_name: String,
}

impl Manifest {
    /// Parse and validate a JSON manifest.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Load a manifest file through the runtime.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self, ManifestError> {
        debug!("Loading manifest from {:?}", path);
        let content = runtime
            .read_to_string(path)
            .map_err(|e| ManifestError::Read {
                path: path.to_path_buf(),
                reason: format!("{:#}", e),
            })?;
        Self::from_json(&content)
    }

    /// The `godwit-bin` manifest shipped with the binary.
    pub fn builtin() -> Result<Self, ManifestError> {
        Self::from_json(BUILTIN_MANIFEST)
    }

    fn from_raw(raw: RawManifest) -> Result<Self, ManifestError> {
        let descriptor = PackageDescriptor::parse(&raw.name, &raw.version)?;

        let mut digests = DigestTable::new();
        for (key, value) in raw.sha256 {
            let triple = TargetTriple::from_key(&key)
                .ok_or_else(|| ManifestError::UnknownPlatformKey { key: key.clone() })?;
            let hash = Sha256Hash::parse(&value)
                .map_err(|reason| ManifestError::InvalidDigest { key, reason })?;
            digests.insert(triple, hash);
        }

        if raw.base_url.trim().is_empty() {
            return Err(ManifestError::InvalidDescriptor {
                reason: "base_url is empty".to_string(),
            });
        }

        let receipt_name = raw
            .receipt_name
            .unwrap_or_else(|| raw.name.to_ascii_lowercase());
        validate_name(&receipt_name)?;
        for name in &raw.conflicts_with {
            validate_name(name)?;
        }

        for entry in &raw.artifacts {
            if let InstallCategory::ManualPage(section) = entry.category
                && !MAN_SECTIONS.contains(&section)
            {
                return Err(ManifestError::InvalidDescriptor {
                    reason: format!(
                        "manual page {} has section {}, expected 1 to 9",
                        entry.path, section
                    ),
                });
            }
        }

        Ok(Self {
            descriptor,
            description: raw.description,
            homepage: raw.homepage,
            base_url: raw.base_url,
            digests,
            conflicts_with: raw.conflicts_with,
            artifacts: raw.artifacts,
            receipt_name,
        })
    }

    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    /// Name this package is recorded under once installed.
    pub fn receipt_name(&self) -> &str {
        &self.receipt_name
    }
}
