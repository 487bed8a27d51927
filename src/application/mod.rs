//! Application layer - use cases orchestrating the installer components.

mod install;

pub use install::{InstallPipeline, InstallReport, InstallRequest, PipelineState};
