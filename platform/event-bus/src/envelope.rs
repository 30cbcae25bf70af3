//! # Event Envelope
//!
//! The unit of transmission on the `passport.events` subject: one UTF-8
//! JSON object per message, camelCase field names on the wire.
//!
//! ## Envelope fields
//!
//! - `event`: lifecycle tag namespaced by record type, e.g. `passport.created`
//! - `payload.recordId`: identifier of the mutated record; partition key
//! - `payload.data`: the mutation body, `null` for deletions
//! - `payload.userId`: identity subject that performed the mutation, taken
//!   from a validated token and never from client input
//! - `payload.timestamp`: assigned by the producer at emission time
//! - `meta.service` / `meta.version`: provenance of the emitting service
//!
//! An envelope is emitted only after the underlying mutation has committed.
//! A crash between commit and publish loses the notification; consumers may
//! rely on eventual per-key-ordered delivery, never on per-mutation delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subject all passport lifecycle events are published to.
pub const PASSPORT_EVENTS_SUBJECT: &str = "passport.events";

/// Mutation payload carried inside an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload<T> {
    /// Identifier of the mutated record (partition/ordering key, non-empty)
    pub record_id: String,

    /// Mutation body; `None` for deletions
    pub data: Option<T>,

    /// Identity subject that performed the mutation
    pub user_id: String,

    /// Emission time, assigned by the producer
    pub timestamp: DateTime<Utc>,
}

/// Provenance of the emitting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMeta {
    pub service: String,
    pub version: String,
}

/// Lifecycle event envelope.
///
/// # Examples
///
/// ```rust
/// use event_bus::EventEnvelope;
/// use serde_json::json;
///
/// let envelope = EventEnvelope::new(
///     "passport.created",
///     "R1",
///     Some(json!({"manufacturer": "Northvolt"})),
///     "U1",
///     "passport-registry",
///     "0.3.0",
/// );
/// assert_eq!(envelope.payload.record_id, "R1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Namespaced lifecycle tag (`passport.created` etc.)
    pub event: String,

    pub payload: EventPayload<T>,

    pub meta: EventMeta,
}

impl<T> EventEnvelope<T> {
    /// Create an envelope with the timestamp assigned now.
    pub fn new(
        event: impl Into<String>,
        record_id: impl Into<String>,
        data: Option<T>,
        user_id: impl Into<String>,
        service: &str,
        version: &str,
    ) -> Self {
        Self {
            event: event.into(),
            payload: EventPayload {
                record_id: record_id.into(),
                data,
                user_id: user_id.into(),
                timestamp: Utc::now(),
            },
            meta: EventMeta {
                service: service.to_string(),
                version: version.to_string(),
            },
        }
    }
}

/// Validate the required fields of a raw envelope.
///
/// Consumers parse untrusted bytes off the wire; this checks the shape
/// before the payload is interpreted.
///
/// # Validation rules
///
/// - `event`: non-empty string
/// - `payload.recordId`: non-empty string
/// - `payload.userId`: non-empty string
/// - `payload.timestamp`: present
/// - `meta.service`: non-empty string
pub fn validate_envelope_fields(envelope: &serde_json::Value) -> Result<(), String> {
    let event = envelope
        .get("event")
        .and_then(|v| v.as_str())
        .ok_or("missing or invalid event")?;
    if event.is_empty() {
        return Err("event cannot be empty".to_string());
    }

    let payload = envelope.get("payload").ok_or("missing payload")?;

    let record_id = payload
        .get("recordId")
        .and_then(|v| v.as_str())
        .ok_or("missing or invalid payload.recordId")?;
    if record_id.is_empty() {
        return Err("payload.recordId cannot be empty".to_string());
    }

    let user_id = payload
        .get("userId")
        .and_then(|v| v.as_str())
        .ok_or("missing or invalid payload.userId")?;
    if user_id.is_empty() {
        return Err("payload.userId cannot be empty".to_string());
    }

    payload
        .get("timestamp")
        .and_then(|v| v.as_str())
        .ok_or("missing or invalid payload.timestamp")?;

    let meta = envelope.get("meta").ok_or("missing meta")?;
    let service = meta
        .get("service")
        .and_then(|v| v.as_str())
        .ok_or("missing or invalid meta.service")?;
    if service.is_empty() {
        return Err("meta.service cannot be empty".to_string());
    }

    // payload.data is intentionally unchecked: null is a valid deletion body
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_construction_assigns_timestamp() {
        let before = Utc::now();
        let envelope = EventEnvelope::new(
            "passport.created",
            "R1",
            Some(json!({"model": "NV-300"})),
            "U1",
            "passport-registry",
            "0.3.0",
        );
        assert_eq!(envelope.event, "passport.created");
        assert_eq!(envelope.payload.record_id, "R1");
        assert_eq!(envelope.payload.user_id, "U1");
        assert!(envelope.payload.timestamp >= before);
        assert_eq!(envelope.meta.service, "passport-registry");
    }

    #[test]
    fn wire_format_is_camel_case() {
        let envelope: EventEnvelope<serde_json::Value> = EventEnvelope::new(
            "passport.updated",
            "R2",
            Some(json!({"capacity": 75})),
            "U7",
            "passport-registry",
            "0.3.0",
        );
        let wire = serde_json::to_value(&envelope).unwrap();

        assert_eq!(wire["payload"]["recordId"], "R2");
        assert_eq!(wire["payload"]["userId"], "U7");
        assert!(wire["payload"]["timestamp"].is_string());
        assert_eq!(wire["meta"]["service"], "passport-registry");
    }

    #[test]
    fn deletion_envelope_carries_null_data() {
        let envelope: EventEnvelope<serde_json::Value> = EventEnvelope::new(
            "passport.deleted",
            "R9",
            None,
            "U2",
            "passport-registry",
            "0.3.0",
        );
        let wire = serde_json::to_value(&envelope).unwrap();
        assert!(wire["payload"]["data"].is_null());
        assert!(validate_envelope_fields(&wire).is_ok());
    }

    #[test]
    fn validate_accepts_well_formed_envelope() {
        let envelope = json!({
            "event": "passport.created",
            "payload": {
                "recordId": "R1",
                "data": {"manufacturer": "Northvolt"},
                "userId": "U1",
                "timestamp": "2024-01-01T00:00:00Z"
            },
            "meta": {"service": "passport-registry", "version": "0.3.0"}
        });
        assert!(validate_envelope_fields(&envelope).is_ok());
    }

    #[test]
    fn validate_rejects_missing_record_id() {
        let envelope = json!({
            "event": "passport.created",
            "payload": {
                "userId": "U1",
                "timestamp": "2024-01-01T00:00:00Z"
            },
            "meta": {"service": "passport-registry", "version": "0.3.0"}
        });
        assert!(validate_envelope_fields(&envelope).is_err());
    }

    #[test]
    fn validate_rejects_empty_record_id() {
        let envelope = json!({
            "event": "passport.deleted",
            "payload": {
                "recordId": "",
                "data": null,
                "userId": "U2",
                "timestamp": "2024-01-01T00:00:00Z"
            },
            "meta": {"service": "passport-registry", "version": "0.3.0"}
        });
        assert!(validate_envelope_fields(&envelope).is_err());
    }

    #[test]
    fn round_trip_preserves_fields() {
        let envelope: EventEnvelope<serde_json::Value> = EventEnvelope::new(
            "passport.created",
            "R1",
            Some(json!({"serialNumber": "SN-42"})),
            "U1",
            "passport-registry",
            "0.3.0",
        );
        let bytes = serde_json::to_vec(&envelope).unwrap();
        let parsed: EventEnvelope<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.event, envelope.event);
        assert_eq!(parsed.payload.record_id, "R1");
        assert_eq!(parsed.payload.timestamp, envelope.payload.timestamp);
    }
}
