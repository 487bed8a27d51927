mod tar_gz;

use crate::error::ExtractionError;
use crate::runtime::Runtime;
use std::path::{Path, PathBuf};

pub use tar_gz::TarGzExtractor;

/// Trait for format-specific archive extractors
pub trait ArchiveExtractor: Send + Sync {
    /// Check if this extractor can handle an archive with the given file name
    fn can_handle(&self, file_name: &str) -> bool;

    /// Unpack `archive` into `extract_to` and return the content root.
    ///
    /// When the archive holds a single top-level directory, that directory
    /// is the content root; otherwise `extract_to` is.
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive: &[u8],
        extract_to: &Path,
    ) -> Result<PathBuf, ExtractionError>;
}

fn runtime_failure(e: anyhow::Error) -> ExtractionError {
    ExtractionError::Failed {
        reason: format!("{:#}", e),
    }
}
