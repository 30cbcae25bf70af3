use std::sync::Arc;

use axum::{routing::get, Json, Router};
use event_bus::{EventBus, InMemoryBus, NatsBus};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use notifications_rs::config::{BusType, Config};
use notifications_rs::consumer::Consumer;
use notifications_rs::sink::{EmailSink, LogSink, NotificationSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = Config::from_env()?;

    // Broker connection is fail-fast: without a subscription this service
    // has nothing to do.
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

    let sink: Arc<dyn NotificationSink> = match &cfg.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, "SMTP delivery configured");
            Arc::new(EmailSink::new(smtp)?)
        }
        None => {
            tracing::info!("SMTP not configured, notifications go to the log");
            Arc::new(LogSink)
        }
    };

    let cancel = CancellationToken::new();
    let consumer = Consumer::new(
        bus,
        sink,
        cfg.consumer_group.clone(),
        cfg.passport_base_url.clone(),
        cfg.notify_to.clone(),
    );
    let mut consumer_task = tokio::spawn(consumer.run(cancel.clone()));

    let app = Router::new().route("/api/health", get(health));
    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "notification service listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
            return Err("health server stopped unexpectedly".into());
        }
        // A consumer that ends on its own (subscribe failure or closed
        // stream) leaves the process with nothing to do; go down with it.
        result = &mut consumer_task => {
            result??;
            return Err("event stream ended, exiting".into());
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    cancel.cancel();
    consumer_task.await??;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "notifications",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
