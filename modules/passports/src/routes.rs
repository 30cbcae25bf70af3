use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use auth_client::{AuthClient, VerifiedIdentity};

use crate::events::{EventPublisher, PassportEvent};
use crate::models::{ErrorBody, PassportBody, PassportDocument};
use crate::store::PassportStore;

#[derive(Clone)]
pub struct AppState {
    pub store: PassportStore,
    pub auth: AuthClient,
    pub events: EventPublisher,
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

fn forbidden() -> ApiErr {
    err(StatusCode::FORBIDDEN, "forbidden", "Forbidden")
}

fn not_found() -> ApiErr {
    err(StatusCode::NOT_FOUND, "not_found", "Not Found")
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/passports", post(create_passport))
        .route(
            "/api/passports/{id}",
            get(get_passport).put(update_passport).delete(delete_passport),
        )
        .route("/api/health", get(health))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "passport-registry",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Resolve the caller's identity through the verification client. All
/// verification failures collapse to `None` (treated as unauthenticated).
async fn identify(state: &AppState, headers: &HeaderMap) -> Option<VerifiedIdentity> {
    let authorization = headers.get("authorization").and_then(|v| v.to_str().ok());
    state.auth.verify(authorization).await
}

/// Log-and-proceed on emit failure: the mutation has already committed, so
/// the request succeeds while the notification is an accepted loss.
async fn emit_after_commit(
    state: &AppState,
    event: PassportEvent,
    record_id: Uuid,
    data: Option<serde_json::Value>,
    user_id: &str,
) {
    if let Err(e) = state
        .events
        .emit(event, &record_id.to_string(), data, user_id)
        .await
    {
        tracing::error!(
            event = event.tag(),
            record_id = %record_id,
            error = %e,
            "mutation committed but event emission failed; notification lost"
        );
    }
}

async fn create_passport(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PassportBody>,
) -> Result<(StatusCode, Json<PassportDocument>), ApiErr> {
    let identity = identify(&state, &headers).await.ok_or_else(unauthorized)?;
    if !identity.is_admin() {
        return Err(forbidden());
    }

    let data = serde_json::to_value(&body).ok();
    let doc = state.store.insert(body);

    emit_after_commit(&state, PassportEvent::Created, doc.id, data, &identity.subject).await;

    Ok((StatusCode::CREATED, Json(doc)))
}

async fn get_passport(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<PassportDocument>, ApiErr> {
    identify(&state, &headers).await.ok_or_else(unauthorized)?;

    let doc = state.store.get(id).ok_or_else(not_found)?;
    Ok(Json(doc))
}

async fn update_passport(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<PassportBody>,
) -> Result<Json<PassportDocument>, ApiErr> {
    let identity = identify(&state, &headers).await.ok_or_else(unauthorized)?;
    if !identity.is_admin() {
        return Err(forbidden());
    }

    let data = serde_json::to_value(&body).ok();
    let doc = state.store.update(id, body).ok_or_else(not_found)?;

    emit_after_commit(&state, PassportEvent::Updated, doc.id, data, &identity.subject).await;

    Ok(Json(doc))
}

async fn delete_passport(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiErr> {
    let identity = identify(&state, &headers).await.ok_or_else(unauthorized)?;
    if !identity.is_admin() {
        return Err(forbidden());
    }

    let doc = state.store.remove(id).ok_or_else(not_found)?;

    // Deletions carry no body: data is null on the wire.
    emit_after_commit(&state, PassportEvent::Deleted, doc.id, None, &identity.subject).await;

    Ok(Json(serde_json::json!({ "deleted": true })))
}
