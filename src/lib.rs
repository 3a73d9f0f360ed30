pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod transcribe;
pub mod translate;

pub use config::Config;
pub use error::{CaptionError, Result};
pub use pipeline::process_video;
pub use server::{build_router, AppState};
pub use store::{Caption, CaptionEntry, CaptionStore};
