use std::path::Path;
use std::sync::Arc;

use crate::tools::ToolRunner;
use crate::Result;

/// Strips video and re-encodes audio to an MP3 container via ffmpeg
pub struct Transcoder {
    runner: Arc<dyn ToolRunner>,
    ffmpeg_bin: String,
    bitrate: String,
}

impl Transcoder {
    pub fn new(runner: Arc<dyn ToolRunner>, ffmpeg_bin: String, bitrate: String) -> Self {
        Self {
            runner,
            ffmpeg_bin,
            bitrate,
        }
    }

    /// Convert `input` to an MP3 at `output` using libmp3lame at the
    /// configured bitrate
    pub async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        self.runner.ensure_available(&self.ffmpeg_bin).await?;

        let args = vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-vn".to_string(),
            "-acodec".to_string(),
            "libmp3lame".to_string(),
            "-b:a".to_string(),
            self.bitrate.clone(),
            output.to_string_lossy().into_owned(),
        ];

        self.runner.run(&self.ffmpeg_bin, &args).await
    }
}
