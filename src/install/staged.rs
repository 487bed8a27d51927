use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

/// Guard for a destination file written under a temporary name.
///
/// The staging file is removed on drop unless [`StagedFile::commit`]
/// renamed it onto its final path.
pub struct StagedFile<'a, R: Runtime> {
    runtime: &'a R,
    staging_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

impl<'a, R: Runtime> StagedFile<'a, R> {
    /// Register a staging file next to `final_path`.
    pub fn new(runtime: &'a R, final_path: &Path) -> Self {
        let file_name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging_path = final_path.with_file_name(format!(".{}.relinst-tmp", file_name));
        Self {
            runtime,
            staging_path,
            final_path: final_path.to_path_buf(),
            committed: false,
        }
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// Move the staging file onto its final name.
    pub fn commit(mut self) -> anyhow::Result<PathBuf> {
        self.runtime.rename(&self.staging_path, &self.final_path)?;
        self.committed = true;
        Ok(self.final_path.clone())
    }
}

impl<R: Runtime> Drop for StagedFile<'_, R> {
    fn drop(&mut self) {
        if self.committed || !self.runtime.exists(&self.staging_path) {
            return;
        }
        debug!("Cleaning up: {:?}", self.staging_path);
        if let Err(e) = self.runtime.remove_file(&self.staging_path) {
            debug!("Failed to remove {:?}: {}", self.staging_path, e);
        }
    }
}
