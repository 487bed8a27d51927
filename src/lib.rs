//! Prebuilt release installer.
//!
//! Resolves the release asset for a platform, verifies the download against
//! a pinned SHA-256 digest, refuses to proceed when a conflicting package is
//! installed, and places the archive's artifacts into per-category
//! destination roots.

pub mod application;
pub mod archive;
pub mod artifact;
pub mod commands;
pub mod conflict;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod package;
pub mod platform;
pub mod receipt;
pub mod release;
pub mod runtime;
pub mod verify;
