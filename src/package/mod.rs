//! Package identity and manifest loading.

mod descriptor;
mod manifest;

pub use descriptor::PackageDescriptor;
pub use manifest::{ArtifactEntry, Manifest};
