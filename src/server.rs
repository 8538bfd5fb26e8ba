//! HTTP surface of the relay.
//!
//! Two routes, matching what the dashboard UI expects:
//!
//! - `POST /extract-ocr` — multipart form with one file field; replies
//!   `{"status":"success","extracted_text":…}` or
//!   `{"status":"error","message":…}`.
//! - `GET /` — liveness probe; static JSON, never touches the inference
//!   server.
//!
//! The relay is stateless per request. [`AppState`] holds only the immutable
//! configuration and the shared backend handle, both constructed once at
//! startup and cloned (cheaply, via `Arc`) into each handler invocation.

use crate::config::RelayConfig;
use crate::error::OcrError;
use crate::extract::{extract_text, UploadedDocument};
use crate::pipeline::infer::InferenceBackend;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared, immutable per-process state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub backend: Arc<dyn InferenceBackend>,
}

impl AppState {
    pub fn new(config: RelayConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
        }
    }
}

// ── Response shapes ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct ExtractResponse {
    status: &'static str,
    extracted_text: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

#[derive(Serialize)]
struct LivenessResponse {
    message: &'static str,
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(ErrorResponse {
            status: "error",
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

// ── Router ───────────────────────────────────────────────────────────────

/// Build the relay router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(liveness))
        .route("/extract-ocr", post(extract_ocr))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until SIGINT/SIGTERM.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), OcrError> {
    let app = router(state);

    info!("OCR relay listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| OcrError::Internal(format!("Failed to bind {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| OcrError::Internal(format!("Server error: {e}")))?;

    info!("Server shutdown complete");
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────

/// GET /
///
/// Always succeeds while the process is up; deliberately independent of the
/// inference server so orchestration probes do not flap with the backend.
async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        message: "OCR relay is running",
    })
}

/// POST /extract-ocr
///
/// Takes the first file-bearing field from the multipart body. The declared
/// content type only resolves the [`UploadedDocument`] tag; the preprocessor
/// validates the actual bitstream.
async fn extract_ocr(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, OcrError> {
    let mut document = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OcrError::Internal(format!("Malformed multipart body: {e}")))?
    {
        // Plain form values (no filename, no content type) are not uploads.
        if field.file_name().is_none() && field.content_type().is_none() {
            continue;
        }
        let media_type = field.content_type().map(|t| t.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| OcrError::Internal(format!("Failed to read upload: {e}")))?;
        document = Some(UploadedDocument::from_media_type(
            data.to_vec(),
            media_type.as_deref(),
        ));
        break;
    }

    let document = document.ok_or(OcrError::MissingFile)?;
    let extraction = extract_text(document, &state.config, state.backend.as_ref()).await?;

    Ok(Json(ExtractResponse {
        status: "success",
        extracted_text: extraction.text,
    }))
}

/// Graceful shutdown on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_render_as_500_with_error_body() {
        let response = OcrError::Transmission {
            reason: "connection refused".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_file_renders_as_400() {
        let response = OcrError::MissingFile.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
