mod auth;
mod config;
mod store;

use axum::{
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::handlers::{login, register, verify, AuthState};
use auth::jwt::JwtKeys;
use auth::password::PasswordPolicy;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,identity_rs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cfg = config::Config::from_env()?;

    // The secret is consumed here and never leaves this state.
    let jwt = JwtKeys::from_secret(&cfg.jwt_secret);

    let pwd = PasswordPolicy {
        memory_kb: cfg.argon_memory_kb,
        iterations: cfg.argon_iterations,
        parallelism: cfg.argon_parallelism,
    };

    let state = Arc::new(AuthState {
        users: store::UserStore::new(),
        jwt,
        pwd,
        access_ttl_minutes: cfg.access_token_ttl_minutes,
    });

    let app = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", get(verify))
        .route("/api/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "identity service listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "identity-auth",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
