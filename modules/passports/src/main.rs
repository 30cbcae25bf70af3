use std::sync::Arc;

use auth_client::AuthClient;
use event_bus::retry::RetryConfig;
use event_bus::{EventBus, InMemoryBus, NatsBus};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use passports_rs::config::{BusType, Config};
use passports_rs::events::EventPublisher;
use passports_rs::routes::{self, AppState};
use passports_rs::store::PassportStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = Config::from_env()?;

    // Broker connection is fail-fast: a registry that cannot emit events
    // should not start half-configured.
    let bus: Arc<dyn EventBus> = match cfg.bus_type {
        BusType::Nats => {
            let url = cfg.nats_url.as_deref().unwrap_or("nats://localhost:4222");
            let client = async_nats::connect(url).await?;
            tracing::info!(%url, "connected to NATS");
            Arc::new(NatsBus::new(client))
        }
        BusType::InMemory => {
            tracing::info!("using in-memory event bus");
            Arc::new(InMemoryBus::new())
        }
    };

    let auth = AuthClient::new(cfg.auth_base_url.clone(), cfg.verify_timeout)?;

    let retry = RetryConfig::no_retry().with_max_attempts(cfg.publish_retry_attempts);
    let events = EventPublisher::new(bus, retry);

    let state = Arc::new(AppState {
        store: PassportStore::new(),
        auth,
        events,
    });

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "passport registry listening");
    axum::serve(listener, app).await?;

    Ok(())
}
