use anyhow::Result;
use log::info;
use std::path::PathBuf;

use crate::{
    application::{InstallPipeline, InstallRequest},
    archive::ArchiveExtractor,
    conflict::ReceiptRegistry,
    download::Downloader,
    install::config::DestinationOverrides,
    platform::PlatformDetector,
    runtime::Runtime,
};

use super::config::Config;
use super::query::PlatformArgs;

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub platform: PlatformArgs,
    pub dry_run: bool,
    pub overrides: DestinationOverrides,
}

#[tracing::instrument(skip(runtime, options))]
pub async fn install<R: Runtime + 'static>(
    runtime: R,
    prefix: Option<PathBuf>,
    manifest: Option<PathBuf>,
    options: InstallOptions,
) -> Result<()> {
    let config = Config::new(runtime, prefix, manifest)?;
    run(config, options).await
}

pub async fn run<R, D, E, P>(config: Config<R, D, E, P>, options: InstallOptions) -> Result<()>
where
    R: Runtime + 'static,
    D: Downloader,
    E: ArchiveExtractor,
    P: PlatformDetector,
{
    let install_config = config.install.with_overrides(options.overrides);
    let registry = ReceiptRegistry::new(&config.runtime, install_config.receipt_dir.clone());
    let pipeline = InstallPipeline::new(
        &config.runtime,
        &config.downloader,
        &config.extractor,
        &registry,
        &install_config,
    );

    let request = InstallRequest {
        platform: options.platform.resolve(&config.detector),
        manifest: config.manifest,
        dry_run: options.dry_run,
    };
    let report = pipeline.run(&request).await?;

    if request.dry_run {
        println!("{}", report.asset.url);
        println!("sha256: {}", report.asset.expected_digest);
        return Ok(());
    }

    for path in &report.installed {
        info!("  {}", path.display());
    }
    info!(
        "Installed {} into {}",
        request.manifest.descriptor(),
        install_config.prefix.display()
    );
    Ok(())
}
