//! HTTP surface: `POST /clip` and `GET /health`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::model::CachedRecipeRecord;
use crate::{ClipError, Clipper};

const SERVICE_NAME: &str = "recipe-clipper";

#[derive(Clone)]
struct AppState {
    clipper: Arc<Clipper>,
}

#[derive(Debug, Deserialize)]
struct ClipRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    service: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

pub fn router(clipper: Arc<Clipper>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/clip", post(clip_handler))
        .with_state(AppState { clipper })
}

/// Serve until the listener fails.
pub async fn serve(listener: TcpListener, clipper: Arc<Clipper>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("{} listening on http://{}", SERVICE_NAME, addr);
    }
    axum::serve(listener, router(clipper)).await
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

async fn clip_handler(
    State(state): State<AppState>,
    payload: Result<Json<ClipRequest>, JsonRejection>,
) -> Result<Json<CachedRecipeRecord>, ClipError> {
    let Json(request) = payload.map_err(|e| ClipError::Validation(e.body_text()))?;
    let url = request.url.unwrap_or_default();

    match state.clipper.clip(&url).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            match e.status_code() {
                500 => error!("Clip failed for {:?}: {}", url, e),
                _ => info!("Clip for {:?} ended with {}", url, e),
            }
            Err(e)
        }
    }
}

impl IntoResponse for ClipError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let details = match &self {
            ClipError::AiResponse { excerpt, .. } => Some(excerpt.clone()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}
