use flate2::read::GzDecoder;
use log::{debug, info};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};

use crate::error::ExtractionError;
use crate::runtime::Runtime;

use super::{ArchiveExtractor, runtime_failure};

/// Extractor for .tar.gz / .tgz archives
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn can_handle(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        name.ends_with(".tar.gz") || name.ends_with(".tgz")
    }

    #[tracing::instrument(skip(self, runtime, archive))]
    fn extract<R: Runtime + 'static>(
        &self,
        runtime: &R,
        archive: &[u8],
        extract_to: &Path,
    ) -> Result<PathBuf, ExtractionError> {
        debug!("Extracting tar.gz archive to {:?}...", extract_to);
        runtime
            .create_dir_all(extract_to)
            .map_err(runtime_failure)?;

        let mut tar = Archive::new(GzDecoder::new(archive));
        let mut files = 0usize;

        for entry in tar.entries()? {
            let mut entry = entry?;
            let entry_path = entry.path()?.into_owned();
            validate_entry_path(&entry_path)?;

            let full_path = extract_to.join(&entry_path);
            match entry.header().entry_type() {
                EntryType::Directory => {
                    runtime.create_dir_all(&full_path).map_err(runtime_failure)?;
                }
                EntryType::Regular | EntryType::Continuous => {
                    if let Some(parent) = full_path.parent() {
                        runtime.create_dir_all(parent).map_err(runtime_failure)?;
                    }
                    let mut dest_file = runtime.create_file(&full_path).map_err(runtime_failure)?;
                    std::io::copy(&mut entry, &mut dest_file)?;
                    drop(dest_file);

                    // Set file permissions from archive metadata (Unix only)
                    #[cfg(unix)]
                    if let Ok(mode) = entry.header().mode()
                        && let Err(e) = runtime.set_permissions(&full_path, mode & 0o7777)
                    {
                        debug!("Failed to set permissions on {:?}: {}", full_path, e);
                    }
                    files += 1;
                }
                other => {
                    debug!("Skipping {:?} entry {:?}", other, entry_path);
                }
            }
        }

        if files == 0 {
            return Err(ExtractionError::EmptyArchive);
        }

        let entries = runtime.read_dir(extract_to).map_err(runtime_failure)?;
        let root = match entries.as_slice() {
            [single] if runtime.is_dir(single) => single.clone(),
            _ => extract_to.to_path_buf(),
        };

        info!("Extracted {} file(s), content root {:?}", files, root);
        Ok(root)
    }
}

/// Reject entries that would land outside the extraction directory.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
