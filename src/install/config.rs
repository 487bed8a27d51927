use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

use crate::artifact::{Destinations, InstallCategory, Shell};
use crate::runtime::Runtime;

/// Per-category destination roots given explicitly by the host.
#[derive(Debug, Clone, Default)]
pub struct DestinationOverrides {
    pub bin_dir: Option<PathBuf>,
    /// Manual page root; sections go to `<man_dir>/man<N>`.
    pub man_dir: Option<PathBuf>,
    pub bash_completion_dir: Option<PathBuf>,
    pub zsh_completion_dir: Option<PathBuf>,
    pub fish_completion_dir: Option<PathBuf>,
}

/// Where the pipeline installs files and records receipts.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub prefix: PathBuf,
    pub destinations: Destinations,
    pub receipt_dir: PathBuf,
}

impl InstallConfig {
    /// Layout under `prefix`, or under the default prefix when `None`.
    pub fn new<R: Runtime>(runtime: &R, prefix: Option<PathBuf>) -> Result<Self> {
        let prefix = match prefix {
            Some(path) => path,
            None => default_install_prefix(runtime)?,
        };
        debug!("Using install prefix: {}", prefix.display());
        Ok(Self::for_prefix(prefix))
    }

    pub fn for_prefix(prefix: PathBuf) -> Self {
        Self {
            destinations: Destinations::from_prefix(&prefix),
            receipt_dir: prefix.join("var").join("relinst").join("receipts"),
            prefix,
        }
    }

    pub fn with_overrides(mut self, overrides: DestinationOverrides) -> Self {
        if let Some(dir) = overrides.bin_dir {
            self.destinations.insert(InstallCategory::Executable, dir);
        }
        if let Some(dir) = overrides.man_dir {
            self.destinations.set_man_root(&dir);
        }
        if let Some(dir) = overrides.bash_completion_dir {
            self.destinations
                .insert(InstallCategory::ShellCompletion(Shell::Bash), dir);
        }
        if let Some(dir) = overrides.zsh_completion_dir {
            self.destinations
                .insert(InstallCategory::ShellCompletion(Shell::Zsh), dir);
        }
        if let Some(dir) = overrides.fish_completion_dir {
            self.destinations
                .insert(InstallCategory::ShellCompletion(Shell::Fish), dir);
        }
        self
    }
}

/// `/usr/local` for privileged users, `~/.local` otherwise.
#[tracing::instrument(skip(runtime))]
pub fn default_install_prefix<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if runtime.is_privileged() {
        Ok(system_install_prefix())
    } else {
        let home_dir = runtime
            .home_dir()
            .context("Could not find home directory")?;
        Ok(home_dir.join(".local"))
    }
}

#[cfg(target_os = "windows")]
fn system_install_prefix() -> PathBuf {
    PathBuf::from(r"C:\ProgramData\relinst")
}

#[cfg(not(target_os = "windows"))]
fn system_install_prefix() -> PathBuf {
    PathBuf::from("/usr/local")
}
