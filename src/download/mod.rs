//! Download collaborator.
//!
//! The pipeline treats fetching as opaque: a URL goes in, bytes or a
//! transport error come out.

use anyhow::Result;
use async_trait::async_trait;
use log::info;

use crate::http::HttpClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Downloader backed by the retrying [`HttpClient`].
pub struct HttpDownloader {
    http_client: HttpClient,
}

impl HttpDownloader {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        info!("Downloading {}...", url);
        let bytes = self.http_client.download_bytes(url).await?;
        info!("Download complete ({} bytes).", bytes.len());
        Ok(bytes)
    }
}
