//! Install categories, artifact sets and their destination roots.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::package::ArtifactEntry;
use crate::runtime::Runtime;

/// Shells that completion scripts can be installed for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
        };
        f.write_str(name)
    }
}

/// Manual sections that have a destination root.
pub const MAN_SECTIONS: RangeInclusive<u8> = 1..=9;

/// Destination role of an extracted file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InstallCategory {
    Executable,
    /// Manual page of the given section.
    ManualPage(u8),
    ShellCompletion(Shell),
}

impl InstallCategory {
    /// File mode applied to installed files of this category.
    pub fn file_mode(self) -> u32 {
        match self {
            InstallCategory::Executable => 0o755,
            _ => 0o644,
        }
    }
}

impl fmt::Display for InstallCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallCategory::Executable => f.write_str("executable"),
            InstallCategory::ManualPage(section) => write!(f, "man{}", section),
            InstallCategory::ShellCompletion(shell) => write!(f, "{} completion", shell),
        }
    }
}

/// An extracted file and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub source_path: PathBuf,
    pub category: InstallCategory,
}

/// Ordered artifacts of one verified, extracted release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn new(artifacts: Vec<Artifact>) -> Self {
        Self { artifacts }
    }

    /// Resolve manifest entries against the extracted content root.
    ///
    /// Every listed entry must exist as a file under `root`.
    #[tracing::instrument(skip(runtime, entries))]
    pub fn resolve<R: Runtime>(
        runtime: &R,
        root: &Path,
        entries: &[ArtifactEntry],
    ) -> Result<Self, ExtractionError> {
        let mut artifacts = Vec::with_capacity(entries.len());
        for entry in entries {
            let relative = Path::new(&entry.path);
            let escapes = relative.is_absolute()
                || relative
                    .components()
                    .any(|c| matches!(c, Component::ParentDir));
            if escapes {
                return Err(ExtractionError::PathTraversal {
                    path: entry.path.clone(),
                });
            }

            let source_path = root.join(relative);
            if !runtime.exists(&source_path) || runtime.is_dir(&source_path) {
                return Err(ExtractionError::MissingArtifact {
                    path: entry.path.clone(),
                });
            }
            artifacts.push(Artifact {
                source_path,
                category: entry.category,
            });
        }
        Ok(Self { artifacts })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Artifact> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}

/// Destination root for each install category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destinations {
    roots: BTreeMap<InstallCategory, PathBuf>,
}

impl Destinations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conventional layout under an installation prefix.
    ///
    /// - executable: `<prefix>/bin`
    /// - manual pages: `<prefix>/share/man/man<N>`
    /// - bash: `<prefix>/etc/bash_completion.d`
    /// - zsh: `<prefix>/share/zsh/site-functions`
    /// - fish: `<prefix>/share/fish/vendor_completions.d`
    pub fn from_prefix(prefix: &Path) -> Self {
        let mut destinations = Self::new();
        destinations.insert(InstallCategory::Executable, prefix.join("bin"));
        destinations.set_man_root(&prefix.join("share").join("man"));
        destinations.insert(
            InstallCategory::ShellCompletion(Shell::Bash),
            prefix.join("etc").join("bash_completion.d"),
        );
        destinations.insert(
            InstallCategory::ShellCompletion(Shell::Zsh),
            prefix.join("share").join("zsh").join("site-functions"),
        );
        destinations.insert(
            InstallCategory::ShellCompletion(Shell::Fish),
            prefix.join("share").join("fish").join("vendor_completions.d"),
        );
        destinations
    }

    /// Point every manual section at `<man_root>/man<N>`.
    pub fn set_man_root(&mut self, man_root: &Path) {
        for section in MAN_SECTIONS {
            self.insert(
                InstallCategory::ManualPage(section),
                man_root.join(format!("man{}", section)),
            );
        }
    }

    pub fn insert(&mut self, category: InstallCategory, root: PathBuf) {
        self.roots.insert(category, root);
    }

    pub fn get(&self, category: InstallCategory) -> Option<&Path> {
        self.roots.get(&category).map(PathBuf::as_path)
    }
}
