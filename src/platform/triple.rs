use std::fmt;

use crate::error::UnsupportedPlatform;

use super::Platform;

/// Operating system family of a platform probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    MacOs,
    Linux,
    Windows,
    FreeBsd,
}

impl OsFamily {
    /// Parse an OS name as reported by hosts and package managers.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "macos" | "darwin" | "osx" | "mac" => Some(OsFamily::MacOs),
            "linux" => Some(OsFamily::Linux),
            "windows" | "win32" | "win" => Some(OsFamily::Windows),
            "freebsd" => Some(OsFamily::FreeBsd),
            _ => None,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OsFamily::MacOs => "macos",
            OsFamily::Linux => "linux",
            OsFamily::Windows => "windows",
            OsFamily::FreeBsd => "freebsd",
        };
        f.write_str(name)
    }
}

/// CPU architecture of a platform probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Aarch64,
    X86,
}

impl Arch {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Arch::X86_64),
            "aarch64" | "arm64" => Some(Arch::Aarch64),
            "x86" | "i386" | "i686" => Some(Arch::X86),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::X86 => "x86",
        };
        f.write_str(name)
    }
}

/// Target a prebuilt release archive is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetTriple {
    DarwinX86_64,
    DarwinAarch64,
    LinuxX86_64,
    LinuxAarch64,
}

/// Supported probes. Adding a platform means adding a row here and a
/// variant to [`TargetTriple`].
const SUPPORTED: &[(OsFamily, Arch, TargetTriple)] = &[
    (OsFamily::MacOs, Arch::X86_64, TargetTriple::DarwinX86_64),
    (OsFamily::MacOs, Arch::Aarch64, TargetTriple::DarwinAarch64),
    (OsFamily::Linux, Arch::X86_64, TargetTriple::LinuxX86_64),
    (OsFamily::Linux, Arch::Aarch64, TargetTriple::LinuxAarch64),
];

impl TargetTriple {
    pub const ALL: [TargetTriple; 4] = [
        TargetTriple::DarwinX86_64,
        TargetTriple::DarwinAarch64,
        TargetTriple::LinuxX86_64,
        TargetTriple::LinuxAarch64,
    ];

    /// Short key used in manifest digest tables (e.g. `darwin-x86_64`).
    pub fn key(self) -> &'static str {
        match self {
            TargetTriple::DarwinX86_64 => "darwin-x86_64",
            TargetTriple::DarwinAarch64 => "darwin-aarch64",
            TargetTriple::LinuxX86_64 => "linux-x86_64",
            TargetTriple::LinuxAarch64 => "linux-aarch64",
        }
    }

    /// Triple string embedded in release archive names.
    pub fn asset_triple(self) -> &'static str {
        match self {
            TargetTriple::DarwinX86_64 => "x86_64-apple-darwin",
            TargetTriple::DarwinAarch64 => "aarch64-apple-darwin",
            TargetTriple::LinuxX86_64 => "x86_64-unknown-linux",
            TargetTriple::LinuxAarch64 => "aarch64-unknown-linux",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Maps platform probes onto supported target triples.
pub struct PlatformMatcher;

impl PlatformMatcher {
    /// Resolve a parsed `(os, arch)` pair.
    pub fn resolve(os: OsFamily, arch: Arch) -> Result<TargetTriple, UnsupportedPlatform> {
        SUPPORTED
            .iter()
            .find(|(o, a, _)| *o == os && *a == arch)
            .map(|(_, _, triple)| *triple)
            .ok_or_else(|| UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
    }

    /// Resolve a raw probe. Names that do not parse are unsupported too.
    #[tracing::instrument]
    pub fn resolve_probe(platform: &Platform) -> Result<TargetTriple, UnsupportedPlatform> {
        let unsupported = || UnsupportedPlatform {
            os: platform.os.clone(),
            arch: platform.arch.clone(),
        };
        let os = OsFamily::parse(&platform.os).ok_or_else(unsupported)?;
        let arch = Arch::parse(&platform.arch).ok_or_else(unsupported)?;
        Self::resolve(os, arch)
    }
}
