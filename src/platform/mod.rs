//! Platform detection and target triple resolution
//!
//! This module maps the host platform (OS family and CPU architecture)
//! onto the closed set of target triples that releases are published for.

mod detection;
mod triple;

pub use detection::{DefaultPlatformDetector, Platform, PlatformDetector};
pub use triple::{Arch, OsFamily, PlatformMatcher, TargetTriple};

#[cfg(test)]
pub use detection::MockPlatformDetector;
