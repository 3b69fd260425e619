use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::acquire::{select_strategy, SegmentedDownloader, StreamFetcher, Strategy, Transcoder};
use crate::config::Config;
use crate::jobs::{Job, JobRegistry};
use crate::store::ArtifactStore;
use crate::tools::ToolRunner;
use crate::Result;

/// Drives jobs through `queued → processing → {completed | failed}`.
///
/// Owns the registry, the artifact store, and the acquisition components.
/// One background task per submitted job; the task's outcome is observable
/// only through the job record, and nothing thrown inside it can escape
/// unrecorded.
pub struct JobRunner {
    registry: JobRegistry,
    store: ArtifactStore,
    fetcher: StreamFetcher,
    transcoder: Transcoder,
    segmented: SegmentedDownloader,
    limiter: Semaphore,
}

impl JobRunner {
    pub fn new(
        config: &Config,
        store: ArtifactStore,
        registry: JobRegistry,
        tools: Arc<dyn ToolRunner>,
    ) -> Result<Self> {
        Ok(Self {
            registry,
            store,
            fetcher: StreamFetcher::new(config.download.max_redirects)?,
            transcoder: Transcoder::new(
                tools.clone(),
                config.tools.ffmpeg_bin.clone(),
                config.tools.audio_bitrate.clone(),
            ),
            segmented: SegmentedDownloader::new(tools, config.tools.ytdlp_bin.clone()),
            limiter: Semaphore::new(config.tools.max_concurrent_jobs.max(1)),
        })
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Register a queued job and dispatch its background task. Returns as
    /// soon as the task is spawned; execution is observed via polling.
    pub fn submit(self: &Arc<Self>, job: Job) -> Job {
        let id = job.id;
        self.registry.insert(job.clone());

        let runner = Arc::clone(self);
        tokio::spawn(async move {
            let task = tokio::spawn({
                let runner = Arc::clone(&runner);
                async move { runner.execute(id).await }
            });
            // even a panicking task must leave a failed job record behind
            if let Err(e) = task.await {
                runner.registry.update(id, |j| {
                    j.mark_failed(format!("job task aborted: {e}"));
                });
            }
        });

        job
    }

    /// Run one job to a terminal state. Exactly one attempt; no retry.
    async fn execute(&self, id: Uuid) {
        // Admission control: the job stays queued until a permit frees up,
        // capping concurrent external-process invocations.
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                self.registry.update(id, |job| {
                    job.mark_failed("job runner is shutting down".to_string());
                });
                return;
            }
        };

        let Some(job) = self.registry.get(id) else {
            return;
        };

        self.registry.update(id, |j| {
            j.mark_processing();
        });

        let base = ArtifactStore::base_name(job.video_id.as_deref(), id);
        let output = self.store.output_path(&base);
        self.registry.update(id, |j| {
            j.record_output_path(output.clone());
        });

        match self.drive(&job, &base, &output).await {
            Ok(()) => {
                tracing::info!("[Job {}] completed: {}", id, output.display());
                self.registry.update(id, |j| {
                    j.mark_completed();
                });
            }
            Err(e) => {
                tracing::error!("[Job {}] {}", id, e);
                // remove whatever partial output may exist
                self.store.cleanup(&output).await;
                self.registry.update(id, |j| {
                    j.mark_failed(e.to_string());
                });
            }
        }
    }

    async fn drive(&self, job: &Job, base: &str, output: &Path) -> Result<()> {
        self.store.ensure_directories().await?;

        let strategy = select_strategy(&job.stream_url);
        tracing::info!("[Job {}] strategy {} for {}", job.id, strategy.as_str(), job.stream_url);

        match strategy {
            Strategy::Segmented => self.segmented.download(&job.stream_url, output).await,
            Strategy::Direct => {
                let tmp_input = self.store.temp_input_path(base);
                let result = self.fetch_and_transcode(&job.stream_url, &tmp_input, output).await;
                // temp input is removed on success and failure alike
                self.store.cleanup(&tmp_input).await;
                result
            }
        }
    }

    async fn fetch_and_transcode(
        &self,
        stream_url: &str,
        tmp_input: &Path,
        output: &Path,
    ) -> Result<()> {
        self.fetcher.fetch(stream_url, tmp_input).await?;
        self.transcoder.transcode(tmp_input, output).await
    }
}
