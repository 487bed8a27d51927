//! Command handlers behind the `relinst` binary.

pub mod config;
mod install;
mod query;

pub use install::{InstallOptions, install};
pub use query::{PlatformArgs, info, locate, verify_file};
