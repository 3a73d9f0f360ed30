use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::audio::AudioSegment;
use crate::error::{CaptionError, Result};
use crate::store::{CaptionEntry, CaptionStore};
use crate::transcribe::Recognizer;

/// Outcome of one segment's recognition call.
#[derive(Debug)]
struct SegmentOutcome {
    index: u32,
    error: Option<String>,
}

/// Statistics from one dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchStats {
    pub total_segments: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_time: Duration,
}

/// Fans a video's segment set out to the recognition service and settles
/// once every call has completed or failed.
///
/// Fan-out width is bounded by a semaphore. Draining the fan-out set to
/// exhaustion is the completion barrier: the caller-facing result is
/// produced exactly once, after the last call settles, no matter the
/// arrival order.
pub struct TranscriptionDispatcher {
    recognizer: Arc<dyn Recognizer>,
    concurrency: usize,
    call_timeout: Duration,
}

impl TranscriptionDispatcher {
    pub fn new(recognizer: Arc<dyn Recognizer>, concurrency: usize, call_timeout: Duration) -> Self {
        Self {
            recognizer,
            concurrency,
            call_timeout,
        }
    }

    /// Transcribe every segment and insert each successful transcript into
    /// the video's caption set as it arrives.
    ///
    /// Individual segment failures leave that time offset absent; the run
    /// only fails as a whole when every segment failed.
    pub async fn dispatch(
        &self,
        segments: Vec<AudioSegment>,
        segment_duration: Duration,
        store: &CaptionStore,
        video_url: &str,
    ) -> Result<DispatchStats> {
        let total_segments = segments.len();
        let start_time = Instant::now();

        if total_segments == 0 {
            return Ok(DispatchStats {
                total_segments: 0,
                succeeded: 0,
                failed: 0,
                total_time: Duration::ZERO,
            });
        }

        info!(
            "Dispatching {} segments with {} concurrent requests using {}",
            total_segments,
            self.concurrency,
            self.recognizer.name()
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut futures = FuturesUnordered::new();

        for segment in segments {
            let sem = semaphore.clone();
            let recognizer = self.recognizer.clone();
            let offset = segment.index as f64 * segment_duration.as_secs_f64();

            let future = async move {
                let _permit = sem.acquire().await.expect("Semaphore closed");

                let call_start = Instant::now();
                let index = segment.index;

                debug!("Starting recognition of segment {}", index);

                let result = match tokio::time::timeout(
                    self.call_timeout,
                    recognizer.recognize(&segment),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(CaptionError::Api(format!(
                        "Recognition timed out after {}s",
                        self.call_timeout.as_secs()
                    ))),
                };
                let duration_ms = call_start.elapsed().as_millis() as u64;

                match result {
                    Ok(transcript) => {
                        debug!("Segment {} completed in {}ms", index, duration_ms);
                        store.insert_entry(video_url, index, CaptionEntry::new(offset, transcript));
                        SegmentOutcome { index, error: None }
                    }
                    Err(e) => {
                        warn!("Segment {} failed: {}", index, e);
                        SegmentOutcome {
                            index,
                            error: Some(e.to_string()),
                        }
                    }
                }
            };

            futures.push(future);
        }

        // Completion barrier: every call settles before the run is reported.
        let mut outcomes: Vec<SegmentOutcome> = Vec::with_capacity(total_segments);
        while let Some(outcome) = futures.next().await {
            outcomes.push(outcome);
        }

        let succeeded = outcomes.iter().filter(|o| o.error.is_none()).count();
        let failed = total_segments - succeeded;
        let total_time = start_time.elapsed();

        info!(
            "Dispatch complete: {}/{} segments transcribed in {:.2}s",
            succeeded,
            total_segments,
            total_time.as_secs_f64()
        );

        if succeeded == 0 {
            let mut errors: Vec<(u32, String)> = outcomes
                .into_iter()
                .filter_map(|o| o.error.map(|e| (o.index, e)))
                .collect();
            errors.sort_by_key(|(index, _)| *index);
            let error_msgs: Vec<String> = errors.into_iter().map(|(_, e)| e).collect();
            return Err(CaptionError::Transcription(format!(
                "All {} segments failed. Errors: {}",
                total_segments,
                error_msgs.join("; ")
            )));
        }

        Ok(DispatchStats {
            total_segments,
            succeeded,
            failed,
            total_time,
        })
    }
}
