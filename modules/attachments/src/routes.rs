use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use auth_client::{AuthClient, VerifiedIdentity};

use crate::store::{AttachmentMeta, ObjectStore};

/// Upload cap, matching the platform-wide attachment limit.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: ObjectStore,
    pub auth: AuthClient,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

type ApiErr = (StatusCode, Json<ErrorBody>);

fn err(code: StatusCode, error: &str, message: impl Into<String>) -> ApiErr {
    (
        code,
        Json(ErrorBody {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

fn unauthorized() -> ApiErr {
    err(StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
}

fn not_found() -> ApiErr {
    err(StatusCode::NOT_FOUND, "not_found", "Not Found")
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/attachments", post(upload_attachment))
        .route(
            "/api/attachments/{id}",
            get(get_attachment).delete(delete_attachment),
        )
        .route("/api/attachments/{id}/meta", get(get_attachment_meta))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "attachments",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn identify(state: &AppState, headers: &HeaderMap) -> Option<VerifiedIdentity> {
    let authorization = headers.get("authorization").and_then(|v| v.to_str().ok());
    state.auth.verify(authorization).await
}

async fn upload_attachment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AttachmentMeta>), ApiErr> {
    let identity = identify(&state, &headers).await.ok_or_else(unauthorized)?;

    // First field named "file" wins; anything else is a bad request.
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        err(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("attachment").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| {
            err(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        })?;

        let meta = state
            .store
            .put(file_name, content_type, bytes, identity.subject);

        tracing::info!(id = %meta.id, size = meta.size, "attachment stored");
        return Ok((StatusCode::CREATED, Json(meta)));
    }

    Err(err(
        StatusCode::BAD_REQUEST,
        "validation_error",
        "file field required",
    ))
}

async fn get_attachment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiErr> {
    identify(&state, &headers).await.ok_or_else(unauthorized)?;

    let stored = state.store.get(id).ok_or_else(not_found)?;
    Ok((
        [(header::CONTENT_TYPE, stored.meta.content_type.clone())],
        stored.bytes,
    ))
}

async fn get_attachment_meta(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<AttachmentMeta>, ApiErr> {
    identify(&state, &headers).await.ok_or_else(unauthorized)?;

    let stored = state.store.get(id).ok_or_else(not_found)?;
    Ok(Json(stored.meta))
}

async fn delete_attachment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiErr> {
    identify(&state, &headers).await.ok_or_else(unauthorized)?;

    state.store.remove(id).ok_or_else(not_found)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
