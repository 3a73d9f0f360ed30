use std::path::Path;

use tracing::{debug, info};

use crate::audio::{SegmentOptions, Segmenter};
use crate::error::Result;
use crate::store::CaptionStore;
use crate::transcribe::{DispatchStats, TranscriptionDispatcher};

/// Clears the in-flight mark for a video on every exit path.
struct FinishGuard<'a> {
    store: &'a CaptionStore,
    video_url: &'a str,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.store.finish_video(self.video_url);
    }
}

/// Run the full captioning pipeline for one video URL:
/// segment the audio into a per-request scratch directory, fan the
/// segments out to the recognition service, and populate the video's
/// caption set as results settle.
///
/// The caption set is reset up front; a concurrent request for the same
/// URL is rejected rather than allowed to race the in-flight run. The
/// scratch directory is removed when the run ends, success or not.
pub async fn process_video(
    store: &CaptionStore,
    segmenter: &dyn Segmenter,
    dispatcher: &TranscriptionDispatcher,
    options: &SegmentOptions,
    scratch_root: Option<&Path>,
    video_url: &str,
) -> Result<DispatchStats> {
    store.begin_video(video_url)?;
    let _finish = FinishGuard { store, video_url };

    let work_dir = match scratch_root {
        Some(root) => {
            std::fs::create_dir_all(root)?;
            tempfile::Builder::new().prefix("captiond-").tempdir_in(root)?
        }
        None => tempfile::Builder::new().prefix("captiond-").tempdir()?,
    };
    debug!("Using scratch directory {:?}", work_dir.path());

    info!("Processing video {}", video_url);

    let segments = segmenter
        .segment(video_url, options, work_dir.path())
        .await?;

    let stats = dispatcher
        .dispatch(segments, options.segment_duration, store, video_url)
        .await?;

    info!(
        "Finished {}: {}/{} segments captioned",
        video_url, stats.succeeded, stats.total_segments
    );

    Ok(stats)
}
