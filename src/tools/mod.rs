use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::{ExtractError, Result};

/// Subprocess execution seam for the job pipeline.
///
/// Abstracted behind a trait so tests can substitute a fake availability
/// oracle and runner without touching the real environment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Probe PATH for a binary, failing with `ToolNotFound` when absent.
    /// Called before every invocation to give a specific diagnostic instead
    /// of an opaque spawn failure.
    async fn ensure_available(&self, binary: &str) -> Result<()>;

    /// Run an external process to completion with inherited standard
    /// streams. Succeeds only on exit code 0; output is never parsed.
    async fn run(&self, command: &str, args: &[String]) -> Result<()>;
}

/// `ToolRunner` backed by the real execution environment
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner;

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn ensure_available(&self, binary: &str) -> Result<()> {
        let probe = if cfg!(windows) { "where" } else { "which" };

        let status = Command::new(probe)
            .arg(binary)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(ExtractError::ToolNotFound(binary.to_string()))
        }
    }

    async fn run(&self, command: &str, args: &[String]) -> Result<()> {
        tracing::debug!("Running {} {}", command, args.join(" "));

        let status = Command::new(command)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(ExtractError::ToolExecutionFailed {
                command: command.to_string(),
                code: status.code().unwrap_or(-1),
            })
        }
    }
}

/// Probe for the external tools the pipeline needs, returning a description
/// of each missing one. Used at startup for a non-fatal warning.
pub async fn check_dependencies(runner: &dyn ToolRunner, ytdlp: &str, ffmpeg: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if runner.ensure_available(ytdlp).await.is_err() {
        missing.push(format!("{ytdlp} - required for segmented/obfuscated streams"));
    }

    if runner.ensure_available(ffmpeg).await.is_err() {
        missing.push(format!("{ffmpeg} - required for MP3 transcoding"));
    }

    missing
}
