use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use panopto_audio_extractor::api::{self, AppContext};
use panopto_audio_extractor::cli::Cli;
use panopto_audio_extractor::config::Config;
use panopto_audio_extractor::jobs::{JobRegistry, JobRunner};
use panopto_audio_extractor::store::ArtifactStore;
use panopto_audio_extractor::tools::{self, SystemToolRunner, ToolRunner};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "panopto_audio_extractor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.output_dir {
        config.storage.output_dir = dir;
    }
    if let Some(dir) = cli.tmp_dir {
        config.storage.tmp_dir = dir;
    }

    let tool_runner: Arc<dyn ToolRunner> = Arc::new(SystemToolRunner);

    // Check for required external tools (non-fatal; jobs fail individually
    // with a specific diagnostic if a tool is still missing at run time)
    let missing = tools::check_dependencies(
        tool_runner.as_ref(),
        &config.tools.ytdlp_bin,
        &config.tools.ffmpeg_bin,
    )
    .await;
    for dep in &missing {
        tracing::warn!("Missing external tool: {dep}");
    }

    let store = ArtifactStore::new(&config.storage);
    store.ensure_directories().await?;

    let runner = Arc::new(JobRunner::new(
        &config,
        store,
        JobRegistry::new(),
        tool_runner,
    )?);
    let app = api::router(AppContext { runner });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Panopto Audio Extractor backend listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
