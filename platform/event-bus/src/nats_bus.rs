//! NATS-based implementation of the EventBus trait

use crate::{BusError, BusMessage, BusResult, EventBus, PARTITION_KEY_HEADER};
use async_nats::Client;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};

/// EventBus implementation backed by a core NATS connection.
///
/// Consumer groups map onto NATS queue groups: every subscriber that joins
/// the same group name receives a disjoint share of the subject's messages.
///
/// # Example
/// ```rust,no_run
/// use event_bus::{EventBus, NatsBus};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = async_nats::connect("nats://localhost:4222").await?;
/// let bus = NatsBus::new(client);
/// bus.publish_keyed("passport.events", "R1", b"{}".to_vec()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NatsBus {
    client: Client,
}

impl NatsBus {
    /// Create a new NatsBus from an already-connected client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn convert(nats_msg: async_nats::Message) -> BusMessage {
        let mut msg = BusMessage::new(nats_msg.subject.to_string(), nats_msg.payload.to_vec());

        if let Some(nats_headers) = nats_msg.headers {
            let mut headers = std::collections::HashMap::new();
            for (key, values) in nats_headers.iter() {
                if let Some(value) = values.first() {
                    headers.insert(key.to_string(), value.to_string());
                }
            }
            if !headers.is_empty() {
                msg = msg.with_headers(headers);
            }
        }

        msg
    }
}

#[async_trait]
impl EventBus for NatsBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| BusError::PublishError(e.to_string()))?;

        Ok(())
    }

    async fn publish_keyed(&self, subject: &str, key: &str, payload: Vec<u8>) -> BusResult<()> {
        let mut headers = async_nats::HeaderMap::new();
        headers.insert(PARTITION_KEY_HEADER, key);

        self.client
            .publish_with_headers(subject.to_string(), headers, payload.into())
            .await
            .map_err(|e| BusError::PublishError(e.to_string()))?;

        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| BusError::SubscribeError(e.to_string()))?;

        Ok(subscriber.map(Self::convert).boxed())
    }

    async fn subscribe_grouped(
        &self,
        subject: &str,
        group: &str,
    ) -> BusResult<BoxStream<'static, BusMessage>> {
        let subscriber = self
            .client
            .queue_subscribe(subject.to_string(), group.to_string())
            .await
            .map_err(|e| BusError::SubscribeError(e.to_string()))?;

        Ok(subscriber.map(Self::convert).boxed())
    }
}
