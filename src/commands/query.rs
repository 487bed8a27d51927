use anyhow::{Context, Result, anyhow};
use log::debug;
use std::path::{Path, PathBuf};

use crate::{
    error::{DigestMismatch, PipelineError},
    package::Manifest,
    platform::{DefaultPlatformDetector, Platform, PlatformDetector, PlatformMatcher},
    release::{ReleaseAsset, ReleaseLocator},
    runtime::Runtime,
    verify::{Sha256Hash, compute_sha256_reader},
};

use super::config::load_manifest;

/// `--os`/`--arch` overrides for the detected platform.
#[derive(Debug, Clone, Default)]
pub struct PlatformArgs {
    pub os: Option<String>,
    pub arch: Option<String>,
}

impl PlatformArgs {
    /// Fill missing parts from `detector`. Detection is skipped when both
    /// parts are given.
    pub fn resolve<P: PlatformDetector + ?Sized>(self, detector: &P) -> Platform {
        match (self.os, self.arch) {
            (Some(os), Some(arch)) => Platform::new(os, arch),
            (os, arch) => detector.detect().with_overrides(os, arch),
        }
    }
}

/// Resolve the release asset for `platform` without touching the network.
pub fn locate_asset(manifest: &Manifest, platform: &Platform) -> Result<ReleaseAsset, PipelineError> {
    let triple = PlatformMatcher::resolve_probe(platform)?;
    let asset = ReleaseLocator::new(&manifest.base_url).locate(
        manifest.descriptor(),
        triple,
        &manifest.digests,
    )?;
    Ok(asset)
}

/// Print the download URL and digest for the requested platform.
#[tracing::instrument(skip(runtime))]
pub fn locate<R: Runtime>(runtime: &R, manifest: Option<PathBuf>, platform: PlatformArgs) -> Result<()> {
    let manifest = load_manifest(runtime, manifest)?;
    let asset = locate_asset(&manifest, &platform.resolve(&DefaultPlatformDetector))?;
    println!("{}", asset.url);
    println!("sha256: {}", asset.expected_digest);
    Ok(())
}

/// Check a local archive against `sha256`, or against the manifest digest
/// for the requested platform.
#[tracing::instrument(skip(runtime))]
pub fn verify_file<R: Runtime>(
    runtime: &R,
    manifest: Option<PathBuf>,
    file: &Path,
    sha256: Option<String>,
    platform: PlatformArgs,
) -> Result<()> {
    let expected = match sha256 {
        Some(hex) => {
            Sha256Hash::parse(&hex).map_err(|reason| anyhow!("invalid --sha256 value: {}", reason))?
        }
        None => {
            let manifest = load_manifest(runtime, manifest)?;
            locate_asset(&manifest, &platform.resolve(&DefaultPlatformDetector))?.expected_digest
        }
    };

    let actual = check_file(runtime, file, &expected)?;
    println!("{}: OK ({})", file.display(), actual);
    Ok(())
}

fn check_file<R: Runtime>(runtime: &R, file: &Path, expected: &Sha256Hash) -> Result<Sha256Hash> {
    let mut reader = runtime.open(file)?;
    let actual = compute_sha256_reader(&mut reader)
        .with_context(|| format!("Failed to read {:?}", file))?;
    debug!("sha256 of {:?}: {}", file, actual);

    if !expected.matches(&actual) {
        return Err(PipelineError::from(DigestMismatch {
            expected: expected.clone(),
            actual,
        })
        .into());
    }
    Ok(actual)
}

/// Print a summary of the manifest.
pub fn info<R: Runtime>(runtime: &R, manifest: Option<PathBuf>) -> Result<()> {
    let manifest = load_manifest(runtime, manifest)?;
    let descriptor = manifest.descriptor();

    println!("Package: {}", descriptor.name());
    println!("Version: {}", descriptor.version());
    if let Some(description) = &manifest.description {
        println!("Description: {}", description);
    }
    if let Some(homepage) = &manifest.homepage {
        println!("Homepage: {}", homepage);
    }
    println!("Recorded as: {}", manifest.receipt_name());

    println!("\nPlatforms:");
    for (triple, digest) in &manifest.digests {
        println!("  {:<16} {}", triple.key(), digest);
    }

    if !manifest.conflicts_with.is_empty() {
        let names: Vec<&str> = manifest.conflicts_with.iter().map(String::as_str).collect();
        println!("\nConflicts with: {}", names.join(", "));
    }

    println!("\nArtifacts:");
    for entry in &manifest.artifacts {
        println!("  {:<28} {}", entry.path, entry.category);
    }
    Ok(())
}
