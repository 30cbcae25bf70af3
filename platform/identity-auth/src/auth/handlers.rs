use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    jwt::JwtKeys,
    password::{hash_password, verify_password, PasswordPolicy},
};
use crate::store::{StoreError, UserRecord, UserStore};

#[derive(Clone)]
pub struct AuthState {
    pub users: UserStore,
    pub jwt: JwtKeys,
    pub pwd: PasswordPolicy,
    pub access_ttl_minutes: i64,
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

#[derive(Debug, Deserialize)]
pub struct RegisterReq {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token_type: &'static str,
    pub access_token: String,
    pub expires_in_seconds: i64,
}

/// Shape consumed by the verification clients of the other services.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub subject: String,
    pub email: String,
    pub role: String,
}

pub async fn register(
    State(state): State<Arc<AuthState>>,
    Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiErr> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(err(StatusCode::BAD_REQUEST, "validation_error", "invalid email"));
    }
    if req.password.is_empty() {
        return Err(err(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "password required",
        ));
    }

    // Only two roles exist; anything that is not explicitly admin is a user.
    let role = match req.role.as_deref() {
        Some("admin") => "admin",
        _ => "user",
    };

    let password_hash = hash_password(&state.pwd, &req.password).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        err(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "hashing failed")
    })?;

    let record = UserRecord {
        id: Uuid::new_v4(),
        email: email.clone(),
        password_hash,
        role: role.to_string(),
    };
    let id = record.id;

    match state.users.insert(record) {
        Ok(()) => {}
        Err(StoreError::DuplicateEmail) => {
            return Err(err(StatusCode::CONFLICT, "conflict", "email already registered"));
        }
    }

    tracing::info!(%id, role, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id,
            email,
            role: role.to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AuthState>>,
    Json(req): Json<LoginReq>,
) -> Result<Json<TokenResponse>, ApiErr> {
    let email = req.email.trim().to_lowercase();

    // Identical rejection for unknown email and wrong password.
    let unauthorized = || err(StatusCode::UNAUTHORIZED, "unauthorized", "invalid credentials");

    let user = state.users.find_by_email(&email).ok_or_else(unauthorized)?;

    let ok = verify_password(&state.pwd, &req.password, &user.password_hash)
        .map_err(|e| {
            tracing::error!(error = %e, "stored hash unreadable");
            err(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "verification failed")
        })?;
    if !ok {
        return Err(unauthorized());
    }

    let access_token = state
        .jwt
        .sign_access_token(user.id, &user.email, &user.role, state.access_ttl_minutes)
        .map_err(|e| {
            tracing::error!(error = %e, "token signing failed");
            err(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "signing failed")
        })?;

    Ok(Json(TokenResponse {
        token_type: "Bearer",
        access_token,
        expires_in_seconds: state.access_ttl_minutes * 60,
    }))
}

pub async fn verify(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, ApiErr> {
    let unauthorized = || err(StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized");

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;

    // Expired, malformed, and mis-signed all land here as a 401.
    let claims = state
        .jwt
        .validate_access_token(token)
        .map_err(|_| unauthorized())?;

    Ok(Json(VerifyResponse {
        subject: claims.sub,
        email: claims.email,
        role: claims.role,
    }))
}
