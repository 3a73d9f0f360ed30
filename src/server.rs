use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::audio::{SegmentOptions, Segmenter};
use crate::config::Config;
use crate::error::{CaptionError, Result};
use crate::pipeline::process_video;
use crate::store::{Caption, CaptionStore};
use crate::transcribe::TranscriptionDispatcher;
use crate::translate::{augment_captions, Translator};

/// Default query window when the client omits start/end.
const DEFAULT_WINDOW_START: f64 = 0.0;
const DEFAULT_WINDOW_END: f64 = 5.0;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CaptionStore>,
    pub segmenter: Arc<dyn Segmenter>,
    pub dispatcher: Arc<TranscriptionDispatcher>,
    pub translator: Arc<dyn Translator>,
    pub config: Arc<Config>,
}

impl IntoResponse for CaptionError {
    fn into_response(self) -> Response {
        let status = match &self {
            CaptionError::Input(_) => StatusCode::BAD_REQUEST,
            CaptionError::NotFound(_) => StatusCode::NOT_FOUND,
            CaptionError::ProcessingInProgress(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsQuery {
    video_url: Option<String>,
    start: Option<f64>,
    end: Option<f64>,
    language: Option<String>,
}

async fn get_captions(
    State(state): State<AppState>,
    Query(query): Query<CaptionsQuery>,
) -> Result<Json<Vec<Caption>>> {
    let video_url = query
        .video_url
        .ok_or_else(|| CaptionError::Input("No video URL provided.".to_string()))?;

    let start = query.start.unwrap_or(DEFAULT_WINDOW_START);
    let end = query.end.unwrap_or(DEFAULT_WINDOW_END);

    // The base language needs no substitution; serve stored text as is.
    let language = query
        .language
        .filter(|lang| lang != &state.config.base_language);

    let captions = state
        .store
        .get_captions(&video_url, start, end, language.as_deref());
    Ok(Json(captions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessVideoRequest {
    video_url: Option<String>,
}

async fn process_video_url(
    State(state): State<AppState>,
    Json(request): Json<ProcessVideoRequest>,
) -> Result<&'static str> {
    let video_url = request
        .video_url
        .ok_or_else(|| CaptionError::Input("No video URL provided.".to_string()))?;

    let options = SegmentOptions::from_config(&state.config);
    process_video(
        &state.store,
        state.segmenter.as_ref(),
        &state.dispatcher,
        &options,
        state.config.scratch_dir.as_deref(),
        &video_url,
    )
    .await?;

    Ok("Transcription complete and captions saved.")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateCaptionRequest {
    video_url: Option<String>,
    language: Option<String>,
}

async fn translate_caption(
    State(state): State<AppState>,
    Json(request): Json<TranslateCaptionRequest>,
) -> Result<&'static str> {
    let video_url = request
        .video_url
        .ok_or_else(|| CaptionError::Input("No video URL provided.".to_string()))?;
    let language = request
        .language
        .ok_or_else(|| CaptionError::Input("No target language provided.".to_string()))?;

    augment_captions(
        &state.store,
        &video_url,
        &language,
        state.translator.as_ref(),
        Duration::from_secs(state.config.request_timeout_secs),
    )
    .await?;

    Ok("Translation complete and captions updated.")
}

/// Assemble the application router: the caption API plus static assets,
/// with permissive CORS for browser clients.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/captions", get(get_captions))
        .route("/process-video-url", post(process_video_url))
        .route("/translate-caption", post(translate_caption))
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true))
        .layer(CorsLayer::permissive())
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server started on port {}", addr.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
}
