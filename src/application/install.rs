//! Install use case - drives one package through the installation pipeline.
//!
//! States advance strictly in order:
//!
//! `Start -> PlatformResolved -> AssetLocated -> Downloaded -> Verified ->
//! ConflictChecked -> Installed`
//!
//! and any transition may end in `Failed` instead. Nothing is written to the
//! filesystem before `ConflictChecked`.

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::archive::ArchiveExtractor;
use crate::artifact::ArtifactSet;
use crate::conflict::{ConflictGuard, ConflictRegistry};
use crate::download::Downloader;
use crate::error::{ExtractionError, InstallFailure, PipelineError};
use crate::install::{ArtifactInstaller, InstallConfig};
use crate::package::Manifest;
use crate::platform::{Platform, PlatformMatcher};
use crate::receipt::Receipt;
use crate::release::{ReleaseAsset, ReleaseLocator};
use crate::runtime::Runtime;
use crate::verify::verify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    PlatformResolved,
    AssetLocated,
    Downloaded,
    Verified,
    ConflictChecked,
    Installed,
    /// Terminal failure, tagged with the error kind.
    Failed(String),
}

/// What to install and for which platform.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub manifest: Manifest,
    pub platform: Platform,
    /// Stop once the asset is located.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub asset: ReleaseAsset,
    /// Installed file paths, in artifact order. Empty for dry runs.
    pub installed: Vec<PathBuf>,
    pub receipt: Option<PathBuf>,
    pub states: Vec<PipelineState>,
}

/// Pipeline context. Every collaborator is passed in explicitly.
pub struct InstallPipeline<'a, R, D, E, C>
where
    R: Runtime + 'static,
    D: Downloader,
    E: ArchiveExtractor,
    C: ConflictRegistry,
{
    runtime: &'a R,
    downloader: &'a D,
    extractor: &'a E,
    registry: &'a C,
    config: &'a InstallConfig,
}

impl<'a, R, D, E, C> InstallPipeline<'a, R, D, E, C>
where
    R: Runtime + 'static,
    D: Downloader,
    E: ArchiveExtractor,
    C: ConflictRegistry,
{
    pub fn new(
        runtime: &'a R,
        downloader: &'a D,
        extractor: &'a E,
        registry: &'a C,
        config: &'a InstallConfig,
    ) -> Self {
        Self {
            runtime,
            downloader,
            extractor,
            registry,
            config,
        }
    }

    pub async fn run(&self, request: &InstallRequest) -> Result<InstallReport, PipelineError> {
        let mut states = Vec::new();
        self.run_traced(request, &mut states).await
    }

    /// Like [`Self::run`], recording each state reached into `states`,
    /// including the terminal `Failed` state.
    #[tracing::instrument(skip(self, request, states), fields(package = %request.manifest.descriptor()))]
    pub async fn run_traced(
        &self,
        request: &InstallRequest,
        states: &mut Vec<PipelineState>,
    ) -> Result<InstallReport, PipelineError> {
        states.push(PipelineState::Start);
        match self.run_stages(request, states).await {
            Ok(report) => Ok(report),
            Err(e) => {
                let reached = states.last().cloned().unwrap_or(PipelineState::Start);
                warn!("Install failed after {:?}: {}", reached, e);
                states.push(PipelineState::Failed(e.kind().to_string()));
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        request: &InstallRequest,
        states: &mut Vec<PipelineState>,
    ) -> Result<InstallReport, PipelineError> {
        let manifest = &request.manifest;
        let descriptor = manifest.descriptor();

        let triple = PlatformMatcher::resolve_probe(&request.platform)?;
        advance(states, PipelineState::PlatformResolved);

        let asset =
            ReleaseLocator::new(&manifest.base_url).locate(descriptor, triple, &manifest.digests)?;
        advance(states, PipelineState::AssetLocated);

        if request.dry_run {
            info!("Dry run: would download {}", asset.url);
            return Ok(InstallReport {
                asset,
                installed: Vec::new(),
                receipt: None,
                states: states.clone(),
            });
        }

        let bytes = self
            .downloader
            .fetch(&asset.url)
            .await
            .map_err(PipelineError::Download)?;
        advance(states, PipelineState::Downloaded);

        verify(&bytes, &asset.expected_digest)?;
        advance(states, PipelineState::Verified);

        let installed_packages = ConflictGuard::installed_among(self.registry, &manifest.conflicts_with)
            .map_err(PipelineError::Registry)?;
        ConflictGuard::check(&installed_packages, &manifest.conflicts_with)?;
        advance(states, PipelineState::ConflictChecked);

        let file_name = asset.archive_file_name();
        if !self.extractor.can_handle(file_name) {
            return Err(ExtractionError::Failed {
                reason: format!("unsupported archive format: {}", file_name),
            }
            .into());
        }
        let staging = tempfile::Builder::new()
            .prefix("relinst-")
            .tempdir()
            .map_err(ExtractionError::Io)?;
        let root = self.extractor.extract(self.runtime, &bytes, staging.path())?;
        let artifacts = ArtifactSet::resolve(self.runtime, &root, &manifest.artifacts)?;

        let installed = ArtifactInstaller::new(self.runtime)
            .install(&artifacts, &self.config.destinations)?;

        let receipt = Receipt {
            name: manifest.receipt_name().to_string(),
            package: descriptor.name().to_string(),
            version: descriptor.version().to_string(),
            triple: triple.key().to_string(),
            sha256: asset.expected_digest.to_string(),
            files: installed.clone(),
        };
        let receipt_path = receipt
            .save(self.runtime, &self.config.receipt_dir)
            .map_err(|e| InstallFailure {
                artifact: PathBuf::from(format!("{}.json", manifest.receipt_name())),
                destination: Some(self.config.receipt_dir.clone()),
                reason: format!("{:#}", e),
            })?;
        advance(states, PipelineState::Installed);

        info!("Installed {} ({} files)", descriptor, installed.len());
        Ok(InstallReport {
            asset,
            installed,
            receipt: Some(receipt_path),
            states: states.clone(),
        })
    }
}

fn advance(states: &mut Vec<PipelineState>, next: PipelineState) {
    debug!("Pipeline state: {:?}", next);
    states.push(next);
}
