//! Conflict checks against mutually exclusive packages.
//!
//! The guard itself is pure; which packages are installed is answered by a
//! host supplied [`ConflictRegistry`].

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use log::debug;

use crate::error::ConflictDetected;
use crate::receipt::receipt_path;
use crate::runtime::Runtime;

/// Answers "is package X currently installed?".
#[cfg_attr(test, mockall::automock)]
pub trait ConflictRegistry: Send + Sync {
    fn is_installed(&self, name: &str) -> Result<bool>;
}

/// Registry backed by the receipts written after successful installs.
pub struct ReceiptRegistry<'a, R: Runtime> {
    runtime: &'a R,
    dir: PathBuf,
}

impl<'a, R: Runtime> ReceiptRegistry<'a, R> {
    pub fn new(runtime: &'a R, dir: PathBuf) -> Self {
        Self { runtime, dir }
    }
}

impl<R: Runtime> ConflictRegistry for ReceiptRegistry<'_, R> {
    fn is_installed(&self, name: &str) -> Result<bool> {
        Ok(self.runtime.exists(&receipt_path(&self.dir, name)))
    }
}

/// Fixed set of installed package names.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry(pub BTreeSet<String>);

impl StaticRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(|n| n.into().to_ascii_lowercase()).collect())
    }
}

impl ConflictRegistry for StaticRegistry {
    fn is_installed(&self, name: &str) -> Result<bool> {
        Ok(self.0.contains(&name.to_ascii_lowercase()))
    }
}

pub struct ConflictGuard;

impl ConflictGuard {
    /// Fail if any of `conflicts_with` is installed. Names compare
    /// case-insensitively; the reported name is the first conflicting one
    /// in `conflicts_with` order.
    pub fn check(
        installed: &BTreeSet<String>,
        conflicts_with: &BTreeSet<String>,
    ) -> Result<(), ConflictDetected> {
        let installed: BTreeSet<String> =
            installed.iter().map(|n| n.to_ascii_lowercase()).collect();

        match conflicts_with
            .iter()
            .find(|name| installed.contains(&name.to_ascii_lowercase()))
        {
            Some(name) => Err(ConflictDetected { name: name.clone() }),
            None => Ok(()),
        }
    }

    /// Query the registry for exactly the conflicting names.
    #[tracing::instrument(skip(registry))]
    pub fn installed_among<C: ConflictRegistry + ?Sized>(
        registry: &C,
        conflicts_with: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>> {
        let mut installed = BTreeSet::new();
        for name in conflicts_with {
            if registry.is_installed(name)? {
                debug!("Conflicting package {} is installed", name);
                installed.insert(name.clone());
            }
        }
        Ok(installed)
    }
}
