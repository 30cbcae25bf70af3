//! In-memory implementation of the EventBus trait for testing and development

use crate::{BusMessage, BusResult, EventBus, PARTITION_KEY_HEADER};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;

/// EventBus implementation using in-memory channels.
///
/// Suitable for unit tests and local development without a broker. All
/// messages go through a single broadcast channel, so subscribers observe
/// the global publish order, which also satisfies the per-key ordering
/// contract.
///
/// `subscribe_grouped` delegates to `subscribe`: the in-memory bus lives in
/// one process, so a consumer group always has exactly one member and the
/// group id carries no meaning here.
///
/// # Example
/// ```rust
/// use event_bus::{EventBus, InMemoryBus};
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryBus::new();
/// let mut stream = bus.subscribe("passport.events").await?;
///
/// bus.publish_keyed("passport.events", "R1", b"{}".to_vec()).await?;
///
/// let msg = stream.next().await.unwrap();
/// assert_eq!(msg.partition_key(), Some("R1"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryBus {
    // One broadcast channel for all subjects; subscribers filter by pattern.
    sender: Arc<broadcast::Sender<BusMessage>>,
}

impl InMemoryBus {
    /// Create a bus with a 1000-message buffer. If a subscriber falls more
    /// than the buffer behind, the oldest messages are dropped for it.
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// NATS-style subject matching: `*` matches a single token, `>` matches
    /// one or more trailing tokens.
    fn matches_pattern(subject: &str, pattern: &str) -> bool {
        let subject_tokens: Vec<&str> = subject.split('.').collect();
        let pattern_tokens: Vec<&str> = pattern.split('.').collect();

        let mut s_idx = 0;
        let mut p_idx = 0;

        while s_idx < subject_tokens.len() && p_idx < pattern_tokens.len() {
            match pattern_tokens[p_idx] {
                ">" => return true,
                "*" => {
                    s_idx += 1;
                    p_idx += 1;
                }
                token if token == subject_tokens[s_idx] => {
                    s_idx += 1;
                    p_idx += 1;
                }
                _ => return false,
            }
        }

        s_idx == subject_tokens.len() && p_idx == pattern_tokens.len()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        let msg = BusMessage::new(subject.to_string(), payload);
        // No receivers is fine: publishing into the void succeeds.
        let _ = self.sender.send(msg);
        Ok(())
    }

    async fn publish_keyed(&self, subject: &str, key: &str, payload: Vec<u8>) -> BusResult<()> {
        let mut headers = std::collections::HashMap::new();
        headers.insert(PARTITION_KEY_HEADER.to_string(), key.to_string());

        let msg = BusMessage::new(subject.to_string(), payload).with_headers(headers);
        let _ = self.sender.send(msg);
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        let mut receiver = self.sender.subscribe();
        let pattern = pattern.to_string();

        let stream = async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(msg) => {
                        if Self::matches_pattern(&msg.subject, &pattern) {
                            yield msg;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "InMemoryBus subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        Ok(stream.boxed())
    }

    async fn subscribe_grouped(
        &self,
        subject: &str,
        _group: &str,
    ) -> BusResult<BoxStream<'static, BusMessage>> {
        // Single process: the group always has one member.
        self.subscribe(subject).await
    }
}
