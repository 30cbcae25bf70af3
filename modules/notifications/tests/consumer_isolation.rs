//! Fault isolation in the consumer loop: bad messages and failing sinks
//! must never stop processing of subsequent messages.

use async_trait::async_trait;
use event_bus::{
    BusError, BusMessage, BusResult, EventBus, EventEnvelope, InMemoryBus,
    PASSPORT_EVENTS_SUBJECT,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use notifications_rs::consumer::Consumer;
use notifications_rs::render::Notification;
use notifications_rs::sink::{NotificationSink, SinkError};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Records every delivered notification.
#[derive(Default)]
struct CollectingSink {
    delivered: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationSink for CollectingSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

impl CollectingSink {
    fn snapshot(&self) -> Vec<Notification> {
        self.delivered.lock().unwrap().clone()
    }
}

/// Fails every delivery but counts the attempts.
#[derive(Default)]
struct FailingSink {
    attempts: Mutex<u32>,
}

#[async_trait]
impl NotificationSink for FailingSink {
    async fn deliver(&self, _notification: &Notification) -> Result<(), SinkError> {
        *self.attempts.lock().unwrap() += 1;
        Err(SinkError::Build("smtp unavailable".into()))
    }
}

fn start_consumer(
    bus: Arc<InMemoryBus>,
    sink: Arc<dyn NotificationSink>,
) -> (CancellationToken, tokio::task::JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let consumer = Consumer::new(
        bus,
        sink,
        "notification-service",
        "http://localhost:8082",
        "ops@example.com",
    );
    let token = cancel.clone();
    let handle = tokio::spawn(async move {
        consumer.run(token).await.unwrap();
    });
    (cancel, handle)
}

async fn publish_envelope(bus: &InMemoryBus, event: &str, record_id: &str, user_id: &str) {
    let envelope = EventEnvelope::new(
        event,
        record_id,
        if event.ends_with("deleted") {
            None
        } else {
            Some(json!({"rev": 1}))
        },
        user_id,
        "passport-registry",
        "0.3.0",
    );
    bus.publish_keyed(
        PASSPORT_EVENTS_SUBJECT,
        record_id,
        serde_json::to_vec(&envelope).unwrap(),
    )
    .await
    .unwrap();
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

#[tokio::test]
async fn poison_message_does_not_stop_processing() {
    let bus = Arc::new(InMemoryBus::new());
    let sink = Arc::new(CollectingSink::default());
    let (cancel, handle) = start_consumer(bus.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Unparseable bytes, then a structurally invalid envelope, then a good one.
    bus.publish(PASSPORT_EVENTS_SUBJECT, b"not json at all".to_vec())
        .await
        .unwrap();
    bus.publish(
        PASSPORT_EVENTS_SUBJECT,
        serde_json::to_vec(&json!({"event": "passport.created", "payload": {}})).unwrap(),
    )
    .await
    .unwrap();
    publish_envelope(&bus, "passport.created", "R1", "U1").await;

    wait_until(|| !sink.snapshot().is_empty()).await;

    let delivered = sink.snapshot();
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].body.contains("Record: R1"));

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn failing_sink_does_not_stop_the_loop() {
    let bus = Arc::new(InMemoryBus::new());
    let sink = Arc::new(FailingSink::default());
    let (cancel, handle) = start_consumer(bus.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;

    for i in 1..=4 {
        publish_envelope(&bus, "passport.updated", &format!("R{i}"), "U1").await;
    }

    wait_until(|| *sink.attempts.lock().unwrap() == 4).await;

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn deletion_with_null_data_is_delivered() {
    let bus = Arc::new(InMemoryBus::new());
    let sink = Arc::new(CollectingSink::default());
    let (cancel, handle) = start_consumer(bus.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;

    publish_envelope(&bus, "passport.deleted", "R9", "U2").await;

    wait_until(|| !sink.snapshot().is_empty()).await;

    let delivered = sink.snapshot();
    assert_eq!(delivered[0].subject, "[Battery Passport] passport.deleted");
    assert!(delivered[0].body.contains("Record: R9"));
    assert!(delivered[0].body.contains("User: U2"));

    cancel.cancel();
    handle.await.unwrap();
}

/// Bus whose subscriptions either fail outright or end immediately.
struct DeadBus {
    subscribe_fails: bool,
}

#[async_trait]
impl EventBus for DeadBus {
    async fn publish(&self, _subject: &str, _payload: Vec<u8>) -> BusResult<()> {
        Ok(())
    }

    async fn publish_keyed(&self, _subject: &str, _key: &str, _payload: Vec<u8>) -> BusResult<()> {
        Ok(())
    }

    async fn subscribe(&self, _subject: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        if self.subscribe_fails {
            Err(BusError::SubscribeError("connection closed".into()))
        } else {
            Ok(futures::stream::empty().boxed())
        }
    }

    async fn subscribe_grouped(
        &self,
        subject: &str,
        _group: &str,
    ) -> BusResult<BoxStream<'static, BusMessage>> {
        self.subscribe(subject).await
    }
}

#[tokio::test]
async fn subscribe_failure_is_returned_to_the_caller() {
    let consumer = Consumer::new(
        Arc::new(DeadBus {
            subscribe_fails: true,
        }),
        Arc::new(CollectingSink::default()),
        "notification-service",
        "http://localhost:8082",
        "ops@example.com",
    );

    let result = consumer.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(BusError::SubscribeError(_))));
}

#[tokio::test]
async fn closed_stream_ends_the_run_without_cancellation() {
    let consumer = Consumer::new(
        Arc::new(DeadBus {
            subscribe_fails: false,
        }),
        Arc::new(CollectingSink::default()),
        "notification-service",
        "http://localhost:8082",
        "ops@example.com",
    );

    // The token is never cancelled; the run must still return once the
    // stream ends so the process can treat a dead consumer as fatal.
    let result = tokio::time::timeout(
        Duration::from_secs(1),
        consumer.run(CancellationToken::new()),
    )
    .await
    .expect("run must return when the stream ends");
    assert!(result.is_ok());
}

#[tokio::test]
async fn same_key_notifications_arrive_in_publish_order() {
    let bus = Arc::new(InMemoryBus::new());
    let sink = Arc::new(CollectingSink::default());
    let (cancel, handle) = start_consumer(bus.clone(), sink.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;

    publish_envelope(&bus, "passport.created", "R1", "U1").await;
    publish_envelope(&bus, "passport.updated", "R1", "U1").await;
    publish_envelope(&bus, "passport.deleted", "R1", "U1").await;

    wait_until(|| sink.snapshot().len() == 3).await;

    let subjects: Vec<String> = sink.snapshot().into_iter().map(|n| n.subject).collect();
    assert_eq!(
        subjects,
        vec![
            "[Battery Passport] passport.created",
            "[Battery Passport] passport.updated",
            "[Battery Passport] passport.deleted",
        ]
    );

    cancel.cancel();
    handle.await.unwrap();
}
