pub mod dispatcher;
pub mod google;

pub use dispatcher::{DispatchStats, TranscriptionDispatcher};
pub use google::GoogleSpeechClient;

use crate::audio::AudioSegment;
use crate::error::Result;
use async_trait::async_trait;

/// Cloud speech-recognition service: one audio segment in, one
/// base-language transcript out. An empty transcript is a valid result
/// for silent or unintelligible audio.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, segment: &AudioSegment) -> Result<String>;
    fn name(&self) -> &'static str;
}
