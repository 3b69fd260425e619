use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::Result;

/// Base name used when a job carries no usable identifier
const DEFAULT_BASE_NAME: &str = "panopto-audio";

/// Manages the on-disk layout for temporary and output files
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
    tmp_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            output_dir: storage.output_dir.clone(),
            tmp_dir: storage.tmp_dir.clone(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Replace every character outside `[A-Za-z0-9_-]` with `_`; empty input
    /// falls back to a fixed default base name
    pub fn sanitize(name: &str) -> String {
        if name.is_empty() {
            return DEFAULT_BASE_NAME.to_string();
        }

        name.chars()
            .map(|c| match c {
                c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => c,
                _ => '_',
            })
            .collect()
    }

    /// Sanitized base name for a job: the caller-supplied video id when
    /// present, the job id otherwise
    pub fn base_name(video_id: Option<&str>, job_id: Uuid) -> String {
        match video_id {
            Some(id) if !id.is_empty() => Self::sanitize(id),
            _ => Self::sanitize(&job_id.to_string()),
        }
    }

    /// Idempotently create the temporary and output directories
    pub async fn ensure_directories(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::create_dir_all(&self.tmp_dir).await?;
        Ok(())
    }

    /// Deterministic output location: `<output_dir>/<base>.mp3`
    pub fn output_path(&self, base: &str) -> PathBuf {
        self.output_dir.join(format!("{base}.mp3"))
    }

    /// Deterministic temporary-input location: `<tmp_dir>/<base>.mp4`
    pub fn temp_input_path(&self, base: &str) -> PathBuf {
        self.tmp_dir.join(format!("{base}.mp4"))
    }

    /// Best-effort delete: a missing file is fine, any other failure is
    /// logged and swallowed
    pub async fn cleanup(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Failed to cleanup file {}: {}", path.display(), e);
            }
        }
    }
}
