pub mod segment;

pub use segment::{check_ffmpeg, FfmpegSegmenter};

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;

/// One fixed-duration slice of a video's audio track, identified by its
/// zero-based index and backed by a WAV file on scratch storage.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    pub index: u32,
    pub path: PathBuf,
}

/// Parameters for splitting a video's audio track.
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    pub segment_duration: Duration,
    pub sample_rate_hz: u32,
    pub channels: u16,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            segment_duration: Duration::from_secs(10),
            sample_rate_hz: 16_000,
            channels: 1,
        }
    }
}

impl SegmentOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            segment_duration: Duration::from_secs(config.segment_duration_secs),
            sample_rate_hz: config.sample_rate_hz,
            channels: config.channels,
        }
    }
}

/// Splits a remote video's audio into fixed-duration segment files.
#[async_trait]
pub trait Segmenter: Send + Sync {
    async fn segment(
        &self,
        video_url: &str,
        options: &SegmentOptions,
        work_dir: &Path,
    ) -> Result<Vec<AudioSegment>>;
}
