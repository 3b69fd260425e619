use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Filesystem layout for temporary and output files
    pub storage: StorageConfig,

    /// External tool settings
    pub tools: ToolsConfig,

    /// Direct-download settings
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for completed MP3 artifacts
    pub output_dir: PathBuf,

    /// Directory for temporary downloads awaiting transcode
    pub tmp_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp binary name or path
    pub ytdlp_bin: String,

    /// ffmpeg binary name or path
    pub ffmpeg_bin: String,

    /// MP3 bitrate passed to ffmpeg (`-b:a`)
    pub audio_bitrate: String,

    /// Maximum jobs allowed to execute external tools concurrently
    pub max_concurrent_jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Redirects followed before a direct download is abandoned
    pub max_redirects: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            tools: ToolsConfig::default(),
            download: DownloadConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 4000 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            tmp_dir: PathBuf::from("tmp"),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            audio_bitrate: "192k".to_string(),
            max_concurrent_jobs: 3,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self { max_redirects: 10 }
    }
}

impl Config {
    /// Load configuration from an explicit path, `./config.yaml` if present,
    /// or defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let local = PathBuf::from("config.yaml");
                local.exists().then_some(local)
            }
        };

        let config = match candidate {
            Some(p) => {
                let content = fs_err::read_to_string(&p)
                    .context("Failed to read config file")?;
                serde_yaml::from_str(&content)
                    .context("Failed to parse config file")?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.tools.ytdlp_bin.is_empty() || self.tools.ffmpeg_bin.is_empty() {
            anyhow::bail!("Tool binary names must not be empty");
        }

        if self.tools.audio_bitrate.is_empty() {
            anyhow::bail!("Audio bitrate must be configured (e.g. 192k)");
        }

        if self.download.max_redirects == 0 {
            anyhow::bail!("max_redirects must be at least 1");
        }

        Ok(())
    }
}
