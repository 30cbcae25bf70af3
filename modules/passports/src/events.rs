//! Event emission for passport lifecycle mutations.
//!
//! `emit` is called strictly after the store mutation has committed. A
//! failed publish after a committed mutation is an accepted gap: the caller
//! logs it and the request still reports the mutation outcome.

use event_bus::retry::{retry_with_backoff, RetryConfig};
use event_bus::{BusError, BusResult, EventBus, EventEnvelope, PASSPORT_EVENTS_SUBJECT};
use std::sync::Arc;

/// Lifecycle events emitted by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassportEvent {
    Created,
    Updated,
    Deleted,
}

impl PassportEvent {
    /// Namespaced tag as it appears in the envelope.
    pub fn tag(self) -> &'static str {
        match self {
            PassportEvent::Created => "passport.created",
            PassportEvent::Updated => "passport.updated",
            PassportEvent::Deleted => "passport.deleted",
        }
    }
}

#[derive(Clone)]
pub struct EventPublisher {
    bus: Arc<dyn EventBus>,
    service: String,
    version: String,
    retry: RetryConfig,
}

impl EventPublisher {
    /// `retry` bounds publish attempts; the default deployment uses a
    /// single attempt (no retry), the documented baseline.
    pub fn new(bus: Arc<dyn EventBus>, retry: RetryConfig) -> Self {
        Self {
            bus,
            service: "passport-registry".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            retry,
        }
    }

    /// Publish one lifecycle envelope, keyed by record id.
    ///
    /// `user_id` must come from a validated identity, never from client
    /// input. `data` is the mutation body; `None` for deletions.
    pub async fn emit(
        &self,
        event: PassportEvent,
        record_id: &str,
        data: Option<serde_json::Value>,
        user_id: &str,
    ) -> BusResult<()> {
        let envelope = EventEnvelope::new(
            event.tag(),
            record_id,
            data,
            user_id,
            &self.service,
            &self.version,
        );

        let bytes = serde_json::to_vec(&envelope)
            .map_err(|e| BusError::SerializationError(e.to_string()))?;

        retry_with_backoff(
            || {
                let bytes = bytes.clone();
                async move {
                    self.bus
                        .publish_keyed(PASSPORT_EVENTS_SUBJECT, record_id, bytes)
                        .await
                }
            },
            &self.retry,
            "publish_passport_event",
        )
        .await?;

        tracing::debug!(
            event = event.tag(),
            record_id,
            "lifecycle event published"
        );

        Ok(())
    }
}
