//! Media materialization
//!
//! A submission carries references (`gs://`, `https://`, local paths), not
//! bytes. Before the analysis phases run, every reference is copied into the
//! request's workspace, so steps read local files and cleanup removes real
//! candidate data. A reference that cannot be fetched fails only the stages
//! that need it.

mod fetch;

pub use fetch::{FetchError, HttpMediaFetcher, MediaSource};

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::types::MediaRef;

/// Copies one media reference to a local file.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Write the bytes behind `source` to `dest`, returning the byte count.
    async fn fetch(&self, source: &MediaRef, dest: &Path) -> Result<u64>;

    /// Implementation name for logging
    fn name(&self) -> &'static str;
}

/// A reference that could not be materialized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} unavailable: {reason}")]
pub struct MissingMedia {
    /// Submission field, e.g. `video_refs[2]`
    pub field: String,
    pub reason: String,
}

pub type Materialized = std::result::Result<PathBuf, MissingMedia>;

/// Local copies of one submission's media.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMedia {
    pub profile_image: Materialized,
    pub id_document: Materialized,
    /// Same order as `MediaRefs::video_refs`
    pub videos: Vec<Materialized>,
}

impl LocalMedia {
    /// Profile image and ID document, both required for identity.
    pub fn identity_images(&self) -> std::result::Result<(PathBuf, PathBuf), MissingMedia> {
        Ok((self.profile_image.clone()?, self.id_document.clone()?))
    }

    /// The identity clip, when it was fetched.
    pub fn identity_video(&self) -> Option<PathBuf> {
        self.videos.first().and_then(|v| v.as_ref().ok()).cloned()
    }

    /// Every question video, or the first one that is missing.
    pub fn question_videos(&self) -> std::result::Result<Vec<PathBuf>, MissingMedia> {
        self.videos.iter().skip(1).cloned().collect()
    }

    pub fn missing(&self) -> impl Iterator<Item = &MissingMedia> {
        [&self.profile_image, &self.id_document]
            .into_iter()
            .chain(self.videos.iter())
            .filter_map(|m| m.as_ref().err())
    }
}
