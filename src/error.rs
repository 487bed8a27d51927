//! Error types for the release installer.
//!
//! Every pipeline stage owns one error type. [`PipelineError`] wraps them
//! without reinterpreting one kind as another, so the top level can report
//! the exact stage that failed and exit with a code specific to it.

use std::path::PathBuf;

use thiserror::Error;

use crate::platform::TargetTriple;
use crate::verify::Sha256Hash;

/// The platform probe does not map to any known target triple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unsupported platform {os}/{arch}: no prebuilt release targets it, use a different installation method"
)]
pub struct UnsupportedPlatform {
    pub os: String,
    pub arch: String,
}

/// The digest table has no entry for the resolved triple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no published release of {name} {version} for {triple}")]
pub struct MissingDigestEntry {
    pub name: String,
    pub version: String,
    pub triple: TargetTriple,
}

/// Downloaded bytes do not hash to the expected digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sha256 mismatch: expected {expected}, got {actual}; the download may be corrupted or tampered with")]
pub struct DigestMismatch {
    pub expected: Sha256Hash,
    pub actual: Sha256Hash,
}

/// A mutually exclusive package is already installed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} is installed and conflicts with this package; uninstall it first")]
pub struct ConflictDetected {
    pub name: String,
}

/// A single artifact could not be placed at its destination.
///
/// Artifacts installed before the failing one are left in place.
#[derive(Debug, Error)]
#[error("failed to install {}: {reason}", artifact.display())]
pub struct InstallFailure {
    /// Source path of the artifact that failed.
    pub artifact: PathBuf,
    /// Destination root, when one was resolved.
    pub destination: Option<PathBuf>,
    /// Description of the underlying error.
    pub reason: String,
}

/// Errors arising while unpacking the verified archive.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An archive entry tries to escape the staging directory.
    #[error("path traversal detected: {path}")]
    PathTraversal { path: String },

    #[error("archive contains no files")]
    EmptyArchive,

    /// A file the manifest lists is not present in the archive.
    #[error("artifact {path} not found in archive")]
    MissingArtifact { path: String },

    #[error("extraction failed: {reason}")]
    Failed { reason: String },
}

/// Errors raised while loading or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown platform key {key:?} in sha256 table")]
    UnknownPlatformKey { key: String },

    #[error("invalid sha256 digest for {key}: {reason}")]
    InvalidDigest { key: String, reason: String },

    #[error("invalid package descriptor: {reason}")]
    InvalidDescriptor { reason: String },
}

/// Any failure of the install pipeline, tagged by the stage that raised it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    #[error(transparent)]
    MissingDigestEntry(#[from] MissingDigestEntry),

    #[error("download failed: {0:#}")]
    Download(anyhow::Error),

    #[error(transparent)]
    DigestMismatch(#[from] DigestMismatch),

    #[error("failed to query installed packages: {0:#}")]
    Registry(anyhow::Error),

    #[error(transparent)]
    ConflictDetected(#[from] ConflictDetected),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    InstallFailure(#[from] InstallFailure),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl PipelineError {
    /// Stable name of the error kind, as shown to the user.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedPlatform(_) => "UnsupportedPlatform",
            PipelineError::MissingDigestEntry(_) => "MissingDigestEntry",
            PipelineError::Download(_) => "Download",
            PipelineError::DigestMismatch(_) => "DigestMismatch",
            PipelineError::Registry(_) => "ConflictRegistry",
            PipelineError::ConflictDetected(_) => "ConflictDetected",
            PipelineError::Extraction(_) => "Extraction",
            PipelineError::InstallFailure(_) => "InstallFailure",
            PipelineError::Manifest(_) => "Manifest",
        }
    }

    /// Process exit status for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::UnsupportedPlatform(_) => 10,
            PipelineError::MissingDigestEntry(_) => 11,
            PipelineError::Download(_) => 12,
            PipelineError::DigestMismatch(_) => 13,
            PipelineError::ConflictDetected(_) => 14,
            PipelineError::Extraction(_) => 15,
            PipelineError::InstallFailure(_) => 16,
            PipelineError::Registry(_) | PipelineError::Manifest(_) => 1,
        }
    }

    /// Extra guidance printed after the error message, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            PipelineError::InstallFailure(_) => Some(
                "artifacts installed before the failure were left in place; no rollback is performed",
            ),
            PipelineError::ConflictDetected(_) => {
                Some("remove the conflicting package, then run the install again")
            }
            _ => None,
        }
    }
}
