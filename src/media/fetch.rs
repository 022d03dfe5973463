//! Reference resolution and the reqwest-backed fetcher
//!
//! - `gs://bucket/object` → `<gcs_base_url>/bucket/object`
//! - `http://` / `https://` → fetched as-is
//! - `file:///path` or an absolute path → copied from local disk

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::MediaFetcher;
use crate::config::{defaults, MediaConfig};
use crate::types::MediaRef;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported media reference '{0}'")]
    Unsupported(String),
}

/// Where the bytes behind a reference come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Remote(String),
    Local(PathBuf),
}

#[derive(Debug, Clone)]
pub struct HttpMediaFetcher {
    http: reqwest::Client,
    gcs_base_url: String,
    auth_token: Option<String>,
}

impl HttpMediaFetcher {
    pub fn new(config: &MediaConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(defaults::HTTP_CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            gcs_base_url: config.gcs_base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn resolve(&self, media: &MediaRef) -> Result<MediaSource, FetchError> {
        let locator = media.as_str().trim();
        let unsupported = || FetchError::Unsupported(locator.to_string());

        if let Some(rest) = locator.strip_prefix("gs://") {
            let (bucket, object) = rest
                .split_once('/')
                .filter(|(bucket, object)| !bucket.is_empty() && !object.is_empty())
                .ok_or_else(unsupported)?;
            return Ok(MediaSource::Remote(format!(
                "{}/{bucket}/{object}",
                self.gcs_base_url
            )));
        }
        if locator.starts_with("http://") || locator.starts_with("https://") {
            return Ok(MediaSource::Remote(locator.to_string()));
        }

        let path = Path::new(locator.strip_prefix("file://").unwrap_or(locator));
        if path.is_absolute() {
            Ok(MediaSource::Local(path.to_path_buf()))
        } else {
            Err(unsupported())
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let mut req = self.http.get(url);
        if let Some(ref token) = self.auth_token {
            req = req.bearer_auth(token);
        }
        let mut resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }

        let io_err = |source: std::io::Error| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        };
        let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;
        let mut written = 0_u64;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_err)?;
        Ok(written)
    }

    async fn copy_local(source: &Path, dest: &Path) -> Result<u64, FetchError> {
        tokio::fs::copy(source, dest)
            .await
            .map_err(|source_err| FetchError::Io {
                path: source.to_path_buf(),
                source: source_err,
            })
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, source: &MediaRef, dest: &Path) -> Result<u64> {
        let resolved = self.resolve(source)?;
        debug!(source = %source, dest = %dest.display(), "Fetching media");
        let bytes = match resolved {
            MediaSource::Remote(url) => self.download(&url, dest).await?,
            MediaSource::Local(path) => Self::copy_local(&path, dest).await?,
        };
        Ok(bytes)
    }

    fn name(&self) -> &'static str {
        "http-media"
    }
}
