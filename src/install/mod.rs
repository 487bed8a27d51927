//! Artifact placement.
//!
//! Each artifact is copied to the destination root of its category. A
//! single copy is all-or-nothing: bytes go to a hidden staging file that is
//! synced to disk and renamed into place only after a complete write, and is
//! removed on any other exit path.
//!
//! The set as a whole is not atomic. When a copy fails, the remaining
//! artifacts are skipped and the ones already installed stay where they
//! are; there is no rollback.

pub mod config;
mod staged;

use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::artifact::{Artifact, ArtifactSet, Destinations};
use crate::error::InstallFailure;
use crate::runtime::Runtime;

pub use config::InstallConfig;
pub use staged::StagedFile;

pub struct ArtifactInstaller<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> ArtifactInstaller<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Install every artifact in order, returning the installed paths.
    ///
    /// Every category must have a destination; this is checked before the
    /// first copy.
    #[tracing::instrument(skip(self, artifacts, destinations))]
    pub fn install(
        &self,
        artifacts: &ArtifactSet,
        destinations: &Destinations,
    ) -> Result<Vec<PathBuf>, InstallFailure> {
        let roots = artifacts
            .iter()
            .map(|artifact| {
                destinations
                    .get(artifact.category)
                    .ok_or_else(|| InstallFailure {
                        artifact: artifact.source_path.clone(),
                        destination: None,
                        reason: format!("no destination configured for {}", artifact.category),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut installed = Vec::with_capacity(artifacts.len());
        for (artifact, root) in artifacts.iter().zip(roots) {
            let path = self
                .install_one(artifact, root)
                .map_err(|e| InstallFailure {
                    artifact: artifact.source_path.clone(),
                    destination: Some(root.to_path_buf()),
                    reason: format!("{:#}", e),
                })?;
            info!("Installed {} -> {:?}", artifact.category, path);
            installed.push(path);
        }
        Ok(installed)
    }

    fn install_one(&self, artifact: &Artifact, root: &Path) -> Result<PathBuf> {
        let file_name = artifact
            .source_path
            .file_name()
            .context("artifact path has no file name")?;
        let final_path = root.join(file_name);

        self.runtime
            .create_dir_all(root)
            .with_context(|| format!("Failed to create destination {:?}", root))?;

        let staged = StagedFile::new(self.runtime, &final_path);
        debug!("Copying {:?} via {:?}", artifact.source_path, staged.staging_path());

        {
            let mut reader = self.runtime.open(&artifact.source_path)?;
            let mut writer = self.runtime.create_file(staged.staging_path())?;
            std::io::copy(&mut reader, &mut writer)
                .with_context(|| format!("Failed to copy {:?}", artifact.source_path))?;
            writer.flush().context("Failed to flush staged file")?;
        }
        self.runtime.sync_file(staged.staging_path())?;

        self.runtime
            .set_permissions(staged.staging_path(), artifact.category.file_mode())?;

        staged.commit()
    }
}
