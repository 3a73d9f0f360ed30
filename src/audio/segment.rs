use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{CaptionError, Result};

use super::{AudioSegment, SegmentOptions, Segmenter};

const SEGMENT_PREFIX: &str = "segment_";
const SEGMENT_EXT: &str = "wav";

/// Check if FFmpeg is installed and accessible.
pub fn check_ffmpeg() -> Result<()> {
    let output = std::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map_err(|e| {
            CaptionError::Segmentation(format!(
                "FFmpeg not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(CaptionError::Segmentation("FFmpeg check failed".to_string()));
    }

    debug!("FFmpeg is available");
    Ok(())
}

/// Segmenter that streams the source URL through FFmpeg's segment muxer,
/// producing mono PCM WAV files named `segment_NNN.wav` in the work
/// directory.
pub struct FfmpegSegmenter {
    timeout: Duration,
}

impl FfmpegSegmenter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Segmenter for FfmpegSegmenter {
    async fn segment(
        &self,
        video_url: &str,
        options: &SegmentOptions,
        work_dir: &Path,
    ) -> Result<Vec<AudioSegment>> {
        let pattern = work_dir.join(format!("{SEGMENT_PREFIX}%03d.{SEGMENT_EXT}"));

        info!("Segmenting audio from {}", video_url);

        let mut command = tokio::process::Command::new("ffmpeg");
        command
            .args(["-i", video_url, "-f", "segment", "-segment_time"])
            .arg(options.segment_duration.as_secs().to_string())
            .arg("-ac")
            .arg(options.channels.to_string())
            .arg("-ar")
            .arg(options.sample_rate_hz.to_string())
            .arg("-vn")
            .arg(&pattern)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                CaptionError::Segmentation(format!(
                    "FFmpeg timed out after {}s for {video_url}",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| CaptionError::Segmentation(format!("Failed to run FFmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptionError::Segmentation(format!(
                "FFmpeg failed for {video_url}: {}",
                stderr.trim()
            )));
        }

        let segments = collect_segments(work_dir)?;
        if segments.is_empty() {
            return Err(CaptionError::EmptySegmentation(video_url.to_string()));
        }

        info!("Produced {} audio segments", segments.len());
        Ok(segments)
    }
}

/// List the work directory and build the ordered segment set from the
/// `segment_NNN.wav` naming convention.
fn collect_segments(work_dir: &Path) -> Result<Vec<AudioSegment>> {
    let mut segments = Vec::new();

    for dir_entry in std::fs::read_dir(work_dir)? {
        let path = dir_entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(index) = parse_segment_index(name) {
            segments.push(AudioSegment { index, path });
        }
    }

    segments.sort_by_key(|s| s.index);
    Ok(segments)
}

/// Parse the zero-based index out of a `segment_NNN.wav` filename.
fn parse_segment_index(name: &str) -> Option<u32> {
    let stem = name
        .strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(&format!(".{SEGMENT_EXT}"))?;
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffmpeg_available() -> bool {
        std::process::Command::new("ffmpeg")
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_check_ffmpeg() {
        if !ffmpeg_available() {
            eprintln!("Skipping test: FFmpeg not available or broken");
            return;
        }
        let result = check_ffmpeg();
        assert!(result.is_ok(), "FFmpeg check failed: {:?}", result.err());
    }

    #[test]
    fn test_parse_segment_index() {
        assert_eq!(parse_segment_index("segment_000.wav"), Some(0));
        assert_eq!(parse_segment_index("segment_042.wav"), Some(42));
        assert_eq!(parse_segment_index("segment_abc.wav"), None);
        assert_eq!(parse_segment_index("segment_000.mp3"), None);
        assert_eq!(parse_segment_index("audio.wav"), None);
    }

    #[test]
    fn test_collect_segments_orders_by_index() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["segment_002.wav", "segment_000.wav", "segment_001.wav"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        // Unrelated files in the work dir are ignored.
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let segments = collect_segments(dir.path()).unwrap();
        let indices: Vec<u32> = segments.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_segment_unreachable_source_fails() {
        if !ffmpeg_available() {
            eprintln!("Skipping test: FFmpeg not available");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let segmenter = FfmpegSegmenter::new(Duration::from_secs(30));
        let result = segmenter
            .segment(
                "/nonexistent/video.mp4",
                &SegmentOptions::default(),
                dir.path(),
            )
            .await;

        assert!(matches!(result, Err(CaptionError::Segmentation(_))));
    }
}
