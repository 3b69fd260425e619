use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "panopto-extractor",
    about = "Panopto Audio Extractor backend - downloads lecture streams and converts them to MP3",
    version,
    long_about = "HTTP service backing the Panopto Audio Extractor browser extension. \
                  Accepts a stream URL, picks a download strategy (direct fetch + ffmpeg \
                  transcode, or yt-dlp for segmented/obfuscated streams), tracks the job \
                  asynchronously, and serves the resulting MP3."
)]
pub struct Cli {
    /// Port to listen on (overrides config, default 4000)
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to the YAML config file (defaults to ./config.yaml when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for completed MP3 artifacts (overrides config)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory for temporary downloads (overrides config)
    #[arg(long, value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,
}
