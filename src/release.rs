//! Release asset location.
//!
//! Maps a package descriptor and target triple onto the download URL and
//! expected digest of the prebuilt archive. No network access happens here.

use std::collections::BTreeMap;

use log::debug;

use crate::error::MissingDigestEntry;
use crate::package::PackageDescriptor;
use crate::platform::TargetTriple;
use crate::verify::Sha256Hash;

/// Expected archive digest per published triple.
pub type DigestTable = BTreeMap<TargetTriple, Sha256Hash>;

/// Where to fetch a release archive and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub url: String,
    pub expected_digest: Sha256Hash,
    pub triple: TargetTriple,
}

impl ReleaseAsset {
    /// Last path segment of the URL, e.g. `GodWit-0.1.1-x86_64-apple-darwin.tar.gz`.
    pub fn archive_file_name(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(&self.url)
    }
}

/// Builds release URLs following
/// `{base}/{name}/releases/download/{version}/{name}-{version}-{triple}.tar.gz`.
#[derive(Debug, Clone)]
pub struct ReleaseLocator {
    base_url: String,
}

impl ReleaseLocator {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[tracing::instrument(skip(self, digests))]
    pub fn locate(
        &self,
        descriptor: &PackageDescriptor,
        triple: TargetTriple,
        digests: &DigestTable,
    ) -> Result<ReleaseAsset, MissingDigestEntry> {
        let expected_digest = digests
            .get(&triple)
            .cloned()
            .ok_or_else(|| MissingDigestEntry {
                name: descriptor.name().to_string(),
                version: descriptor.version().to_string(),
                triple,
            })?;

        let name = descriptor.name();
        let version = descriptor.version();
        let url = format!(
            "{base}/{name}/releases/download/{version}/{name}-{version}-{triple}.tar.gz",
            base = self.base_url,
            name = name,
            version = version,
            triple = triple.asset_triple(),
        );
        debug!("Located {} for {}: {}", descriptor, triple, url);

        Ok(ReleaseAsset {
            url,
            expected_digest,
            triple,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, OsFamily, PlatformMatcher};

    const DARWIN_SHA: &str = "974351ca7d00083ba2fad52e2f2539c8ff114119c139420f592507962ab43b75";
    const LINUX_SHA: &str = "c6bba6d643b1a1f18994683e26d4d2b998b41a7a7360e63cb8ec9db8ffbf793c";

    fn godwit() -> PackageDescriptor {
        PackageDescriptor::parse("GodWit", "0.1.1").unwrap()
    }

    fn digests() -> DigestTable {
        DigestTable::from([
            (
                TargetTriple::DarwinX86_64,
                Sha256Hash::parse(DARWIN_SHA).unwrap(),
            ),
            (
                TargetTriple::LinuxX86_64,
                Sha256Hash::parse(LINUX_SHA).unwrap(),
            ),
        ])
    }

    #[test]
    fn test_locate_macos_x86_64() {
        let triple = PlatformMatcher::resolve(OsFamily::MacOs, Arch::X86_64).unwrap();
        let locator = ReleaseLocator::new("https://github.com/Passeriform");

        let asset = locator.locate(&godwit(), triple, &digests()).unwrap();

        assert_eq!(
            asset.url,
            "https://github.com/Passeriform/GodWit/releases/download/0.1.1/GodWit-0.1.1-x86_64-apple-darwin.tar.gz"
        );
        assert_eq!(asset.expected_digest.as_str(), DARWIN_SHA);
        assert_eq!(
            asset.archive_file_name(),
            "GodWit-0.1.1-x86_64-apple-darwin.tar.gz"
        );
    }

    #[test]
    fn test_locate_linux_x86_64() {
        let triple = PlatformMatcher::resolve(OsFamily::Linux, Arch::X86_64).unwrap();
        let locator = ReleaseLocator::new("https://github.com/Passeriform");

        let asset = locator.locate(&godwit(), triple, &digests()).unwrap();

        assert!(asset.url.ends_with("x86_64-unknown-linux.tar.gz"));
        assert_eq!(asset.expected_digest.as_str(), LINUX_SHA);
    }

    #[test]
    fn test_locate_is_pure() {
        let locator = ReleaseLocator::new("https://github.com/Passeriform");
        let first = locator
            .locate(&godwit(), TargetTriple::LinuxX86_64, &digests())
            .unwrap();
        let second = locator
            .locate(&godwit(), TargetTriple::LinuxX86_64, &digests())
            .unwrap();
        assert_eq!(first.url.as_bytes(), second.url.as_bytes());
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_table_entry_embeds_version_and_triple() {
        let locator = ReleaseLocator::new("https://example.com/releases/");
        let descriptor = PackageDescriptor::parse("tool", "3.2.1-beta.2").unwrap();
        let table: DigestTable = TargetTriple::ALL
            .into_iter()
            .map(|t| (t, Sha256Hash::of(t.key().as_bytes())))
            .collect();

        for triple in table.keys() {
            let asset = locator.locate(&descriptor, *triple, &table).unwrap();
            assert!(asset.url.contains("3.2.1-beta.2"), "{}", asset.url);
            assert!(asset.url.contains(triple.asset_triple()), "{}", asset.url);
            assert!(asset.url.starts_with("https://example.com/releases/tool/"));
            assert!(!asset.url.contains("releases//"));
        }
    }

    #[test]
    fn test_missing_digest_entry() {
        let locator = ReleaseLocator::new("https://github.com/Passeriform");
        let err = locator
            .locate(&godwit(), TargetTriple::DarwinAarch64, &digests())
            .unwrap_err();
        assert_eq!(
            err,
            MissingDigestEntry {
                name: "GodWit".into(),
                version: "0.1.1".into(),
                triple: TargetTriple::DarwinAarch64,
            }
        );
    }
}
