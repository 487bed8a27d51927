use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    archive::TarGzExtractor,
    download::HttpDownloader,
    http::HttpClient,
    install::InstallConfig,
    package::Manifest,
    platform::DefaultPlatformDetector,
    runtime::Runtime,
};

/// Everything a command needs, built once from CLI arguments and environment.
pub struct Config<R: Runtime, D, E, P> {
    pub runtime: R,
    pub downloader: D,
    pub extractor: E,
    pub detector: P,
    pub manifest: Manifest,
    pub install: InstallConfig,
}

impl<R: Runtime> Config<R, HttpDownloader, TarGzExtractor, DefaultPlatformDetector> {
    pub fn new(runtime: R, prefix: Option<PathBuf>, manifest_path: Option<PathBuf>) -> Result<Self> {
        let manifest = load_manifest(&runtime, manifest_path)?;
        let install = InstallConfig::new(&runtime, prefix)?;
        let downloader = HttpDownloader::new(HttpClient::default_client()?);

        Ok(Self {
            runtime,
            downloader,
            extractor: TarGzExtractor,
            detector: DefaultPlatformDetector,
            manifest,
            install,
        })
    }
}

/// The manifest at `path`, or the built-in one.
pub fn load_manifest<R: Runtime>(runtime: &R, path: Option<PathBuf>) -> Result<Manifest> {
    let manifest = match path {
        Some(path) => Manifest::load(runtime, &path)?,
        None => {
            debug!("Using built-in manifest");
            Manifest::builtin()?
        }
    };
    Ok(manifest)
}
