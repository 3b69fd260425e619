//! Panopto Audio Extractor backend
//!
//! An HTTP service that accepts a Panopto stream URL, downloads the stream
//! (directly or via yt-dlp for segmented/obfuscated deliveries), converts it
//! to MP3 with ffmpeg, and serves the result once the background job finishes.

pub mod acquire;
pub mod api;
pub mod cli;
pub mod config;
pub mod jobs;
pub mod store;
#[cfg(test)]
pub(crate) mod testutil;
pub mod tools;

pub use acquire::{select_strategy, Strategy};
pub use config::Config;
pub use jobs::{Job, JobRegistry, JobStatus};

/// Result type used throughout the job pipeline
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Failures that can occur while acquiring and converting a stream
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("{0} was not found in PATH")]
    ToolNotFound(String),

    #[error("{command} exited with code {code}")]
    ToolExecutionFailed { command: String, code: i32 },

    #[error("download failed with status {status}")]
    DownloadFailed { status: u16 },

    #[error("download failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("too many redirects (stopped after {0})")]
    TooManyRedirects(usize),

    #[error("invalid redirect location: {0}")]
    InvalidRedirect(String),

    #[error("invalid stream URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
