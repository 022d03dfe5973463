//! File layout inside one workspace
//!
//! ```text
//! <root>/
//!   images/profile_pic.jpg
//!   images/id_document.jpg
//!   videos/video0.webm        identity clip
//!   videos/video1.webm ...    one per question
//!   audios/                   extracted audio, written by transcription
//! ```

use std::path::{Path, PathBuf};

const VIDEOS: &str = "videos";
const AUDIOS: &str = "audios";
const IMAGES: &str = "images";

/// Where each piece of media lives under a workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directories created with the workspace.
    pub fn subdirs(&self) -> [PathBuf; 3] {
        [self.videos_dir(), self.audios_dir(), self.images_dir()]
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.root.join(VIDEOS)
    }

    pub fn audios_dir(&self) -> PathBuf {
        self.root.join(AUDIOS)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES)
    }

    /// Submitted video `index`, counting the identity clip as 0.
    pub fn video_path(&self, index: usize) -> PathBuf {
        self.videos_dir().join(format!("video{index}.webm"))
    }

    pub fn image_path(&self, name: &str) -> PathBuf {
        self.images_dir().join(name)
    }

    pub fn profile_image_path(&self) -> PathBuf {
        self.image_path("profile_pic.jpg")
    }

    pub fn id_document_path(&self) -> PathBuf {
        self.image_path("id_document.jpg")
    }
}
