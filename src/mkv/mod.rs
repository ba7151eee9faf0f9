// Modular MKV tool architecture
//
// This module provides a clean abstraction over the mkvtoolnix tools:
// - Commands: command builder capturing exit status and output
// - Toolkit: inspection, extraction and remuxing implementations

pub mod commands;
pub mod toolkit;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use commands::*;
pub use toolkit::*;

use crate::config::ToolsConfig;
use crate::error::Result;

/// Track type reported by mkvmerge for subtitle streams
pub const SUBTITLE_TRACK_TYPE: &str = "subtitles";

/// One elementary stream inside a container file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    pub id: u64,
    pub track_type: String,
    /// Human-readable codec name, e.g. "HDMV PGS"
    pub codec: String,
    /// Matroska codec id, e.g. "S_HDMV/PGS"
    pub codec_id: String,
    /// Language tag inherited by converted subtitles
    pub language: Option<String>,
}

/// A planned extraction: which track to pull and where its artifact lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSpec {
    pub track_id: u64,
    pub artifact: PathBuf,
}

/// A converted subtitle artifact carrying its source track's language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedSubtitle {
    pub path: PathBuf,
    pub language: Option<String>,
}

/// Main trait for MKV container operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MkvToolkit: Send + Sync {
    /// List the tracks of a container file
    async fn identify(&self, file: &Path) -> Result<Vec<TrackDescriptor>>;

    /// Extract the given tracks into their artifact paths, all in one invocation
    async fn extract_tracks(&self, file: &Path, specs: &[TrackSpec]) -> Result<()>;

    /// Remux the container with the converted subtitles attached as new tracks
    async fn merge(&self, file: &Path, subtitles: &[ConvertedSubtitle], output: &Path)
        -> Result<()>;

    /// Check that the underlying tools are available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating toolkit instances
pub struct MkvToolkitFactory;

impl MkvToolkitFactory {
    /// Create the default toolkit implementation (mkvtoolnix-based)
    pub fn create_toolkit(config: ToolsConfig) -> Box<dyn MkvToolkit> {
        Box::new(toolkit::MkvmergeToolkit::new(config))
    }
}
