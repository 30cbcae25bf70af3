//! # Event Bus Abstraction
//!
//! Publish-subscribe messaging for passport lifecycle events.
//!
//! The passport registry publishes one envelope per committed mutation to
//! the `passport.events` subject, keyed by record id; the notifications
//! service drains that subject under a consumer group. Both sides talk to
//! the broker through the [`EventBus`] trait so the backend can be swapped
//! by configuration:
//!
//! - **NatsBus**: production implementation over a core NATS connection
//! - **InMemoryBus**: in-process implementation for dev and tests
//!
//! Delivery is at-least-once: a message may be redelivered after a consumer
//! restart, and consumers must tolerate duplicates. Per-key ordering is the
//! broker's publish order on the subject; there is no cross-key guarantee.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use event_bus::{EventBus, NatsBus, InMemoryBus};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Production: NATS
//! let client = async_nats::connect("nats://localhost:4222").await?;
//! let bus: Arc<dyn EventBus> = Arc::new(NatsBus::new(client));
//!
//! // Dev/Test: in-memory
//! let bus: Arc<dyn EventBus> = Arc::new(InMemoryBus::new());
//!
//! bus.publish_keyed("passport.events", "R1", b"{}".to_vec()).await?;
//!
//! let mut stream = bus.subscribe_grouped("passport.events", "notification-service").await?;
//! while let Some(msg) = futures::StreamExt::next(&mut stream).await {
//!     println!("received {} bytes on {}", msg.payload.len(), msg.subject);
//! }
//! # Ok(())
//! # }
//! ```

mod envelope;
mod inmemory_bus;
mod nats_bus;
pub mod retry;

pub use envelope::{
    validate_envelope_fields, EventEnvelope, EventMeta, EventPayload, PASSPORT_EVENTS_SUBJECT,
};
pub use inmemory_bus::InMemoryBus;
pub use nats_bus::NatsBus;

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;

/// Header carrying the partition/ordering key of a published message.
pub const PARTITION_KEY_HEADER: &str = "Partition-Key";

/// A message received from the event bus
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// The subject this message was published to
    pub subject: String,
    /// The message payload (raw bytes; UTF-8 JSON for lifecycle events)
    pub payload: Vec<u8>,
    /// Optional headers (carries the partition key when published keyed)
    pub headers: Option<std::collections::HashMap<String, String>>,
}

impl BusMessage {
    pub fn new(subject: String, payload: Vec<u8>) -> Self {
        Self {
            subject,
            payload,
            headers: None,
        }
    }

    pub fn with_headers(mut self, headers: std::collections::HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// The partition key this message was published under, if any.
    pub fn partition_key(&self) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|h| h.get(PARTITION_KEY_HEADER))
            .map(String::as_str)
    }
}

/// Errors that can occur when using the event bus
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to publish message: {0}")]
    PublishError(String),

    #[error("failed to subscribe to subject: {0}")]
    SubscribeError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for event bus operations
pub type BusResult<T> = Result<T, BusError>;

/// Core event bus abstraction for publish-subscribe messaging
///
/// Producers use [`publish_keyed`](EventBus::publish_keyed) so the record id
/// travels with the message as its ordering key; consumers use
/// [`subscribe_grouped`](EventBus::subscribe_grouped) so a horizontally
/// scaled service receives each message once per group.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a message to a subject.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()>;

    /// Publish a message with a partition key.
    ///
    /// The key rides in the [`PARTITION_KEY_HEADER`] header. Messages that
    /// share a key and subject are delivered in publish order.
    async fn publish_keyed(&self, subject: &str, key: &str, payload: Vec<u8>) -> BusResult<()>;

    /// Subscribe to messages matching a subject pattern.
    ///
    /// Patterns support NATS wildcards: `*` matches one token, `>` matches
    /// one or more trailing tokens.
    async fn subscribe(&self, subject: &str) -> BusResult<BoxStream<'static, BusMessage>>;

    /// Subscribe under a consumer group.
    ///
    /// Within one group each message is delivered to a single member. The
    /// stream ends when the underlying connection closes.
    async fn subscribe_grouped(
        &self,
        subject: &str,
        group: &str,
    ) -> BusResult<BoxStream<'static, BusMessage>>;
}

impl fmt::Debug for dyn EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventBus")
    }
}
