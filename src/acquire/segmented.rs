use std::path::Path;
use std::sync::Arc;

use crate::tools::ToolRunner;
use crate::Result;

/// Downloads segmented/obfuscated streams end-to-end with yt-dlp.
///
/// yt-dlp selects the best audio stream, extracts it, and transcodes to MP3
/// at maximum quality directly at the output path; no intermediate file is
/// produced.
pub struct SegmentedDownloader {
    runner: Arc<dyn ToolRunner>,
    ytdlp_bin: String,
}

impl SegmentedDownloader {
    pub fn new(runner: Arc<dyn ToolRunner>, ytdlp_bin: String) -> Self {
        Self { runner, ytdlp_bin }
    }

    pub async fn download(&self, stream_url: &str, output: &Path) -> Result<()> {
        self.runner.ensure_available(&self.ytdlp_bin).await?;

        let args = vec![
            stream_url.to_string(),
            "--no-progress".to_string(),
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--audio-quality".to_string(),
            "0".to_string(),
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
        ];

        self.runner.run(&self.ytdlp_bin, &args).await
    }
}
