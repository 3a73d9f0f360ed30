//! Google Cloud Translation (v2) client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CaptionError, Result};
use crate::translate::Translator;

const TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Translator backed by the Google Cloud Translation REST API.
pub struct GoogleTranslateClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleTranslateClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: TRANSLATE_URL.to_string(),
        }
    }

    /// Override the endpoint URL (for tests against a local mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize, Debug)]
struct TranslateResponse {
    data: Option<TranslateData>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Deserialize, Debug)]
struct Translation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

#[async_trait]
impl Translator for GoogleTranslateClient {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        debug!("Translating {} chars to {}", text.len(), target_lang);

        let request = TranslateRequest {
            q: text,
            target: target_lang,
            format: "text",
        };

        let url = format!("{}?key={}", self.base_url, self.api_key);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CaptionError::Api(format!("Translation request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CaptionError::Api(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(CaptionError::Api(format!(
                "Translation API error ({status}): {body}"
            )));
        }

        let parsed: TranslateResponse = serde_json::from_str(&body)
            .map_err(|e| CaptionError::Api(format!("Failed to parse translation response: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(CaptionError::Api(format!(
                "Translation error: {}",
                error.message
            )));
        }

        parsed
            .data
            .and_then(|d| d.translations.into_iter().next())
            .map(|t| t.translated_text)
            .ok_or_else(|| CaptionError::Api("Translation response had no result".to_string()))
    }

    fn name(&self) -> &'static str {
        "Google Translate"
    }
}
