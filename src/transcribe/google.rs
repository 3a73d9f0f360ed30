use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::AudioSegment;
use crate::error::{CaptionError, Result};
use crate::transcribe::Recognizer;

/// Google Cloud Speech-to-Text synchronous recognition endpoint.
const RECOGNIZE_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Google Cloud Speech-to-Text client.
///
/// Ships each segment as inline base64 LINEAR16 samples. The WAV header is
/// stripped locally so the payload carries raw PCM plus the explicit
/// sample rate the API expects.
pub struct GoogleSpeechClient {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
}

impl GoogleSpeechClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            language: "en-US".to_string(),
            base_url: RECOGNIZE_URL.to_string(),
        }
    }

    /// Set the language the audio is transcribed into.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Override the endpoint URL (for tests against a local mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Read a WAV file and return its raw little-endian LINEAR16 payload and
/// sample rate.
fn read_linear16(path: &Path) -> Result<(Vec<u8>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| CaptionError::Transcription(format!("Failed to read {}: {e}", path.display())))?;

    let spec = reader.spec();
    let samples: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| {
                CaptionError::Transcription(format!("Failed to decode {}: {e}", path.display()))
            })?,
        hound::SampleFormat::Float => {
            return Err(CaptionError::Transcription(format!(
                "Unsupported float WAV format in {}",
                path.display()
            )));
        }
    };

    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }

    Ok((bytes, spec.sample_rate))
}

#[derive(Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: String,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Deserialize, Debug)]
struct RecognizeResponse {
    results: Option<Vec<SpeechResult>>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct SpeechResult {
    alternatives: Option<Vec<SpeechAlternative>>,
}

#[derive(Deserialize, Debug)]
struct SpeechAlternative {
    transcript: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

#[async_trait]
impl Recognizer for GoogleSpeechClient {
    async fn recognize(&self, segment: &AudioSegment) -> Result<String> {
        let (pcm, sample_rate) = read_linear16(&segment.path)?;
        let content = base64::engine::general_purpose::STANDARD.encode(&pcm);

        debug!(
            "Recognizing segment {} ({} bytes at {} Hz)",
            segment.index,
            pcm.len(),
            sample_rate
        );

        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: sample_rate,
                language_code: self.language.clone(),
            },
            audio: RecognitionAudio { content },
        };

        let url = format!("{}?key={}", self.base_url, self.api_key);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CaptionError::Api(format!("Recognition request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CaptionError::Api(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(CaptionError::Api(format!(
                "Recognition API error ({status}): {body}"
            )));
        }

        let parsed: RecognizeResponse = serde_json::from_str(&body)
            .map_err(|e| CaptionError::Api(format!("Failed to parse recognition response: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(CaptionError::Api(format!(
                "Recognition error: {}",
                error.message
            )));
        }

        // A response with no results is a silent segment, not a failure.
        let transcript = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| r.alternatives)
            .filter_map(|alts| alts.into_iter().next())
            .filter_map(|alt| alt.transcript)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(transcript)
    }

    fn name(&self) -> &'static str {
        "Google Speech-to-Text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_wav(path: &Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_client_creation() {
        let client = GoogleSpeechClient::new("test-key".to_string());
        assert_eq!(client.name(), "Google Speech-to-Text");
        assert_eq!(client.language, "en-US");
    }

    #[test]
    fn test_with_language() {
        let client = GoogleSpeechClient::new("test-key".to_string()).with_language("ja-JP");
        assert_eq!(client.language, "ja-JP");
    }

    #[test]
    fn test_read_linear16_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_test_wav(&path, &[0, 100, -100, i16::MAX]);

        let (pcm, sample_rate) = read_linear16(&path).unwrap();
        assert_eq!(sample_rate, 16_000);
        assert_eq!(pcm.len(), 8);
        assert_eq!(&pcm[2..4], &100i16.to_le_bytes());
    }

    #[tokio::test]
    async fn test_recognize_missing_file() {
        let client = GoogleSpeechClient::new("test-key".to_string());
        let segment = AudioSegment {
            index: 0,
            path: PathBuf::from("/tmp/nonexistent_segment.wav"),
        };

        let result = client.recognize(&segment).await;
        assert!(result.is_err());
    }
}
