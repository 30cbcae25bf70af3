use std::sync::Arc;

use auth_client::AuthClient;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use attachments_rs::config::Config;
use attachments_rs::routes::{self, AppState};
use attachments_rs::store::ObjectStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = Config::from_env()?;

    let auth = AuthClient::new(cfg.auth_base_url.clone(), cfg.verify_timeout)?;

    let state = Arc::new(AppState {
        store: ObjectStore::new(),
        auth,
    });

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "attachments service listening");
    axum::serve(listener, app).await?;

    Ok(())
}
