// HTTP server - download endpoint, health check and error mapping

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::StreamExt;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;

use crate::downloader::tools::ToolManager;
use crate::downloader::utils::ascii_filename;
use crate::downloader::{DownloadError, DownloadRequest, Downloader, OutputArtifact};

/// Shared, immutable collaborators of every request
#[derive(Clone)]
pub struct AppState {
    pub downloader: Arc<Downloader>,
    pub tools: Arc<ToolManager>,
}

/// Raw query string; validated into a `DownloadRequest` by the handler
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
    pub quality: Option<String>,
}

/// Error response with JSON body `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<DownloadError> for ApiError {
    fn from(err: DownloadError) -> Self {
        let (status, message) = match &err {
            DownloadError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            DownloadError::Resolution(details) => (
                StatusCode::NOT_FOUND,
                format!("Failed to resolve video: {}", details),
            ),
            DownloadError::NoStreamAvailable => (StatusCode::NOT_FOUND, err.to_string()),
            DownloadError::Fetch(_) | DownloadError::Mux(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to download video: {}", err),
            ),
            DownloadError::Timeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                format!("Failed to download video: {}", err),
            ),
        };
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/download-youtube-video", get(download_youtube_video))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn download_youtube_video(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let request = DownloadRequest::validate(query.url.as_deref(), query.quality.as_deref())
        .inspect_err(|e| tracing::warn!(kind = e.kind(), error = %e, "rejected download request"))?;

    let artifact = state.downloader.download(&request).await?;
    Ok(attachment(artifact))
}

/// 200 response streaming the combined file as an attachment.
///
/// The body owns the scratch guard, so the directory is removed once the body
/// is fully sent or dropped on disconnect.
fn attachment(artifact: OutputArtifact) -> Response {
    let file_name = artifact.file_name();
    let size = artifact.content.size();
    let (file, scratch) = artifact.content.into_parts();
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _guard = &scratch;
        chunk
    });

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&file_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    (StatusCode::OK, headers, Body::from_stream(stream)).into_response()
}

fn content_disposition(file_name: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_filename(file_name),
        urlencoding::encode(file_name)
    )
}

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let tools = Arc::clone(&state.tools);
    // Probing runs `--version` on each tool synchronously
    let tools = tokio::task::spawn_blocking(move || tools.get_all_tools())
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("tool probe failed: {}", e),
        })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "tools": tools,
    })))
}

/// Serve until Ctrl+C
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
