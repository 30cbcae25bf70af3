//! Consumer loop for the `passport.events` subject.
//!
//! Subscribes under a consumer group and processes one message at a time.
//! A message that cannot be parsed, fails validation, or fails delivery is
//! logged and dropped; a single bad message never takes the loop down.
//! Only the initial subscription is fatal.

use std::sync::Arc;

use event_bus::{
    validate_envelope_fields, BusMessage, BusResult, EventBus, EventEnvelope,
    PASSPORT_EVENTS_SUBJECT,
};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::render::render;
use crate::sink::NotificationSink;

pub struct Consumer {
    bus: Arc<dyn EventBus>,
    sink: Arc<dyn NotificationSink>,
    group: String,
    link_base: String,
    recipient: String,
}

impl Consumer {
    pub fn new(
        bus: Arc<dyn EventBus>,
        sink: Arc<dyn NotificationSink>,
        group: impl Into<String>,
        link_base: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            sink,
            group: group.into(),
            link_base: link_base.into(),
            recipient: recipient.into(),
        }
    }

    /// Drain the subject until cancelled or the stream ends.
    ///
    /// Returns an error only if the subscription itself cannot be
    /// established; per-message failures are contained inside the loop.
    pub async fn run(self, cancel: CancellationToken) -> BusResult<()> {
        let mut stream = self
            .bus
            .subscribe_grouped(PASSPORT_EVENTS_SUBJECT, &self.group)
            .await?;

        tracing::info!(
            subject = PASSPORT_EVENTS_SUBJECT,
            group = %self.group,
            "consumer subscribed"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("shutdown requested, stopping consumer");
                    break;
                }
                msg = stream.next() => match msg {
                    Some(msg) => self.handle(msg).await,
                    None => {
                        tracing::warn!("event stream closed, stopping consumer");
                        break;
                    }
                },
            }
        }

        Ok(())
    }

    async fn handle(&self, msg: BusMessage) {
        let raw: serde_json::Value = match serde_json::from_slice(&msg.payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, subject = %msg.subject, "unparseable message dropped");
                return;
            }
        };

        if let Err(reason) = validate_envelope_fields(&raw) {
            tracing::warn!(%reason, subject = %msg.subject, "malformed envelope dropped");
            return;
        }

        let envelope: EventEnvelope<serde_json::Value> = match serde_json::from_value(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, subject = %msg.subject, "malformed envelope dropped");
                return;
            }
        };

        let notification = render(&envelope, &self.link_base, &self.recipient);

        match self.sink.deliver(&notification).await {
            Ok(()) => {
                tracing::debug!(
                    event = %envelope.event,
                    record_id = %envelope.payload.record_id,
                    "notification delivered"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    event = %envelope.event,
                    record_id = %envelope.payload.record_id,
                    "delivery failed, notification dropped"
                );
            }
        }
    }
}
