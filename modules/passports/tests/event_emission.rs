//! Producer-side contract: envelopes land on `passport.events`, keyed by
//! record id, in emission order.

use event_bus::retry::RetryConfig;
use event_bus::{validate_envelope_fields, EventBus, InMemoryBus, PASSPORT_EVENTS_SUBJECT};
use futures::StreamExt;
use passports_rs::events::{EventPublisher, PassportEvent};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn publisher(bus: Arc<InMemoryBus>) -> EventPublisher {
    EventPublisher::new(bus, RetryConfig::no_retry())
}

async fn next_envelope(
    stream: &mut futures::stream::BoxStream<'static, event_bus::BusMessage>,
) -> (event_bus::BusMessage, serde_json::Value) {
    let msg = tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("timeout waiting for event")
        .expect("stream ended");
    let value: serde_json::Value = serde_json::from_slice(&msg.payload).expect("valid JSON");
    (msg, value)
}

#[tokio::test]
async fn created_event_carries_record_user_and_data() {
    let bus = Arc::new(InMemoryBus::new());
    let mut stream = bus.subscribe(PASSPORT_EVENTS_SUBJECT).await.unwrap();

    publisher(bus.clone())
        .emit(
            PassportEvent::Created,
            "R1",
            Some(json!({"generalInformation": {"manufacturer": "Northvolt"}})),
            "U1",
        )
        .await
        .unwrap();

    let (msg, envelope) = next_envelope(&mut stream).await;

    assert_eq!(msg.subject, PASSPORT_EVENTS_SUBJECT);
    assert_eq!(msg.partition_key(), Some("R1"));
    assert!(validate_envelope_fields(&envelope).is_ok());
    assert_eq!(envelope["event"], "passport.created");
    assert_eq!(envelope["payload"]["recordId"], "R1");
    assert_eq!(envelope["payload"]["userId"], "U1");
    assert_eq!(
        envelope["payload"]["data"]["generalInformation"]["manufacturer"],
        "Northvolt"
    );
    assert_eq!(envelope["meta"]["service"], "passport-registry");
}

#[tokio::test]
async fn deleted_event_has_null_data() {
    let bus = Arc::new(InMemoryBus::new());
    let mut stream = bus.subscribe(PASSPORT_EVENTS_SUBJECT).await.unwrap();

    publisher(bus.clone())
        .emit(PassportEvent::Deleted, "R9", None, "U2")
        .await
        .unwrap();

    let (_, envelope) = next_envelope(&mut stream).await;
    assert_eq!(envelope["event"], "passport.deleted");
    assert!(envelope["payload"]["data"].is_null());
    assert!(validate_envelope_fields(&envelope).is_ok());
}

#[tokio::test]
async fn same_key_events_are_delivered_in_emission_order() {
    let bus = Arc::new(InMemoryBus::new());
    let mut stream = bus.subscribe(PASSPORT_EVENTS_SUBJECT).await.unwrap();
    let publisher = publisher(bus.clone());

    publisher
        .emit(PassportEvent::Created, "R1", Some(json!({"rev": 1})), "U1")
        .await
        .unwrap();
    publisher
        .emit(PassportEvent::Updated, "R1", Some(json!({"rev": 2})), "U1")
        .await
        .unwrap();
    publisher
        .emit(PassportEvent::Deleted, "R1", None, "U1")
        .await
        .unwrap();

    let expected = ["passport.created", "passport.updated", "passport.deleted"];
    for tag in expected {
        let (msg, envelope) = next_envelope(&mut stream).await;
        assert_eq!(envelope["event"], tag);
        assert_eq!(msg.partition_key(), Some("R1"));
    }
}
