use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::jobs::{Job, JobRunner, JobStatus};

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub runner: Arc<JobRunner>,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    pub stream_url: Option<String>,
    pub video_id: Option<String>,
    pub delivery_param: Option<String>,
    pub delivery_response: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub job_id: Uuid,
    pub status_url: String,
    pub download_url: String,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Router
// ============================================================================

/// Build the request surface. The output directory is additionally exposed
/// as a static fallback, a secondary access path to completed artifacts.
pub fn router(ctx: AppContext) -> Router {
    let output_dir = ctx.runner.store().output_dir().to_path_buf();

    Router::new()
        .route("/healthz", get(health))
        .route("/api/extract", post(extract))
        .route("/api/jobs", get(list_jobs))
        .route("/api/jobs/:id", get(get_job))
        .route("/api/jobs/:id/download", get(download))
        .fallback_service(ServeDir::new(output_dir))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /healthz - liveness probe
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /api/extract - create a job and dispatch its background execution.
/// Responds before any download/conversion work starts.
async fn extract(State(ctx): State<AppContext>, Json(request): Json<ExtractRequest>) -> Response {
    let Some(stream_url) = request.stream_url.filter(|url| !url.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "streamUrl is required");
    };

    let job = ctx.runner.submit(Job::new(
        stream_url,
        request.video_id,
        request.delivery_param,
        request.delivery_response,
    ));

    tracing::info!("[Job {}] accepted for {}", job.id, job.stream_url);

    Json(ExtractResponse {
        job_id: job.id,
        status_url: format!("/api/jobs/{}", job.id),
        download_url: format!("/api/jobs/{}/download", job.id),
    })
    .into_response()
}

/// GET /api/jobs - list every known job (diagnostic endpoint, no pagination)
async fn list_jobs(State(ctx): State<AppContext>) -> Json<JobListResponse> {
    Json(JobListResponse {
        jobs: ctx.runner.registry().all(),
    })
}

/// GET /api/jobs/:id - full job record
async fn get_job(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> Response {
    match ctx.runner.registry().get(id) {
        Some(job) => Json(job).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Job not found"),
    }
}

/// GET /api/jobs/:id/download - stream the MP3 as an attachment.
/// 404 until the job is completed and the artifact file exists on disk.
async fn download(State(ctx): State<AppContext>, Path(id): Path<Uuid>) -> Response {
    let Some(job) = ctx.runner.registry().get(id) else {
        return error_response(StatusCode::NOT_FOUND, "MP3 not ready");
    };

    if job.status != JobStatus::Completed {
        return error_response(StatusCode::NOT_FOUND, "MP3 not ready");
    }

    let Some(path) = job.output_path else {
        return error_response(StatusCode::NOT_FOUND, "MP3 not ready");
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(_) => return error_response(StatusCode::NOT_FOUND, "MP3 not ready"),
    };

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio.mp3".to_string());

    let headers = [
        (header::CONTENT_TYPE, "audio/mpeg".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];

    (headers, Body::from_stream(ReaderStream::new(file))).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::jobs::JobRegistry;
    use crate::store::ArtifactStore;
    use crate::testutil::wait_terminal;
    use crate::tools::MockToolRunner;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app_with(dir: &std::path::Path, tools: MockToolRunner) -> (Router, AppContext) {
        let mut config = Config::default();
        config.storage.output_dir = dir.join("output");
        config.storage.tmp_dir = dir.join("tmp");

        let store = ArtifactStore::new(&config.storage);
        let runner = Arc::new(
            JobRunner::new(&config, store, JobRegistry::new(), Arc::new(tools)).unwrap(),
        );
        let ctx = AppContext { runner };
        (router(ctx.clone()), ctx)
    }

    fn mp3_writing_tools() -> MockToolRunner {
        let mut tools = MockToolRunner::new();
        tools.expect_ensure_available().returning(|_| Ok(()));
        tools.expect_run().returning(|_, args| {
            std::fs::write(args.last().unwrap(), b"mp3 bytes").unwrap();
            Ok(())
        });
        tools
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_extract(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/extract")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, _) = app_with(tmp.path(), MockToolRunner::new());

        let response = app.oneshot(get("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_extract_requires_stream_url() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, _) = app_with(tmp.path(), MockToolRunner::new());

        let response = app
            .clone()
            .oneshot(post_extract(serde_json::json!({"videoId": "x"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "streamUrl is required");

        let response = app
            .oneshot(post_extract(serde_json::json!({"streamUrl": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_extract_creates_pollable_job() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, ctx) = app_with(tmp.path(), mp3_writing_tools());

        let response = app
            .clone()
            .oneshot(post_extract(serde_json::json!({
                "streamUrl": "https://cdn.example.com/stream.m3u8",
                "videoId": "lecture-1",
                "deliveryParam": "abc"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let job_id = body["jobId"].as_str().unwrap().to_string();
        assert_eq!(body["statusUrl"], format!("/api/jobs/{job_id}"));
        assert_eq!(body["downloadUrl"], format!("/api/jobs/{job_id}/download"));

        let response = app
            .clone()
            .oneshot(get(&format!("/api/jobs/{job_id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let job = body_json(response).await;
        assert_eq!(job["streamUrl"], "https://cdn.example.com/stream.m3u8");
        assert_eq!(job["videoId"], "lecture-1");

        let response = app.oneshot(get("/api/jobs")).await.unwrap();
        let listing = body_json(response).await;
        assert_eq!(listing["jobs"].as_array().unwrap().len(), 1);

        wait_terminal(ctx.runner.registry(), job_id.parse().unwrap()).await;
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, _) = app_with(tmp.path(), MockToolRunner::new());

        let id = Uuid::new_v4();
        let response = app
            .clone()
            .oneshot(get(&format!("/api/jobs/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(get(&format!("/api/jobs/{id}/download")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_is_404_until_completed() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, ctx) = app_with(tmp.path(), MockToolRunner::new());

        // a job that has not left the queue yet
        let job = Job::new("https://cdn.example.com/a.mp4".into(), None, None, None);
        let id = job.id;
        ctx.runner.registry().insert(job);

        let response = app
            .oneshot(get(&format!("/api/jobs/{id}/download")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "MP3 not ready");
    }

    #[tokio::test]
    async fn test_download_serves_completed_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, ctx) = app_with(tmp.path(), mp3_writing_tools());

        let job = ctx.runner.submit(Job::new(
            "https://cdn.example.com/stream.m3u8".into(),
            Some("lecture-2".into()),
            None,
            None,
        ));
        wait_terminal(ctx.runner.registry(), job.id).await;

        let response = app
            .oneshot(get(&format!("/api/jobs/{}/download", job.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE.as_str()],
            "audio/mpeg"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION.as_str()],
            "attachment; filename=\"lecture-2.mp3\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"mp3 bytes");
    }

    #[tokio::test]
    async fn test_output_dir_is_served_as_static_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let (app, ctx) = app_with(tmp.path(), mp3_writing_tools());

        let job = ctx.runner.submit(Job::new(
            "https://cdn.example.com/stream.m3u8".into(),
            Some("static-check".into()),
            None,
            None,
        ));
        wait_terminal(ctx.runner.registry(), job.id).await;

        let response = app.oneshot(get("/static-check.mp3")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"mp3 bytes");
    }
}
