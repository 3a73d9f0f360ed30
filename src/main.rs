use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use captiond::audio::{check_ffmpeg, FfmpegSegmenter};
use captiond::config::Config;
use captiond::server::{serve, AppState};
use captiond::store::CaptionStore;
use captiond::transcribe::{GoogleSpeechClient, TranscriptionDispatcher};
use captiond::translate::GoogleTranslateClient;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "captiond")]
#[command(version, about = "Time-windowed video captioning server")]
#[command(
    long_about = "Serve captions for remote videos: audio is segmented with FFmpeg, transcribed by a cloud speech service, and optionally translated on demand."
)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Number of concurrent recognition requests per video
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Directory of static assets served at /
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(static_dir) = cli.static_dir {
        config.static_dir = static_dir;
    }

    config.validate().context("Configuration validation failed")?;

    if let Err(e) = check_ffmpeg() {
        warn!("{e}. Video processing requests will fail until FFmpeg is installed.");
    }

    let api_key = config
        .api_key
        .clone()
        .context("API key missing after validation")?;
    let call_timeout = Duration::from_secs(config.request_timeout_secs);

    let state = AppState {
        store: Arc::new(CaptionStore::new(config.max_videos)),
        segmenter: Arc::new(FfmpegSegmenter::new(call_timeout)),
        dispatcher: Arc::new(TranscriptionDispatcher::new(
            Arc::new(
                GoogleSpeechClient::new(api_key.clone()).with_language(config.base_language.clone()),
            ),
            config.concurrency,
            call_timeout,
        )),
        translator: Arc::new(GoogleTranslateClient::new(api_key)),
        config: Arc::new(config),
    };

    info!("Port:        {}", state.config.port);
    info!("Language:    {}", state.config.base_language);
    info!("Segments:    {}s", state.config.segment_duration_secs);
    info!("Concurrency: {}", state.config.concurrency);
    info!("Static dir:  {}", state.config.static_dir.display());

    serve(state).await.context("Server error")?;

    Ok(())
}
