use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("Invalid request: {0}")]
    Input(String),

    #[error("Audio segmentation failed: {0}")]
    Segmentation(String),

    #[error("Audio segmentation produced no segments for {0}")]
    EmptySegmentation(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("No captions found for video: {0}")]
    NotFound(String),

    #[error("Video is already being processed: {0}")]
    ProcessingInProgress(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CaptionError>;
