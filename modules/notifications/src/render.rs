//! Renders a lifecycle envelope into a plain-text notification.

use event_bus::EventEnvelope;

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}

/// Build the notification for an envelope.
///
/// The body carries the event tag, record id, acting user, emission time,
/// and a direct link to the record. Deletions render the same way; the
/// absent data body does not appear in the text.
pub fn render(
    envelope: &EventEnvelope<serde_json::Value>,
    link_base: &str,
    recipient: &str,
) -> Notification {
    let subject = format!("[Battery Passport] {}", envelope.event);
    let body = format!(
        "Event: {}\nRecord: {}\nUser: {}\nTime: {}\nLink: {}/api/passports/{}",
        envelope.event,
        envelope.payload.record_id,
        envelope.payload.user_id,
        envelope.payload.timestamp.to_rfc3339(),
        link_base.trim_end_matches('/'),
        envelope.payload.record_id,
    );

    Notification {
        subject,
        body,
        recipient: recipient.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rendered_body_names_record_user_and_link() {
        let envelope = EventEnvelope::new(
            "passport.created",
            "R1",
            Some(json!({"manufacturer": "Northvolt"})),
            "U1",
            "passport-registry",
            "0.3.0",
        );

        let n = render(&envelope, "http://localhost:8082/", "ops@example.com");

        assert_eq!(n.subject, "[Battery Passport] passport.created");
        assert!(n.body.contains("Record: R1"));
        assert!(n.body.contains("User: U1"));
        assert!(n.body.contains("Link: http://localhost:8082/api/passports/R1"));
        assert_eq!(n.recipient, "ops@example.com");
    }

    #[test]
    fn deletion_renders_without_data_body() {
        let envelope: EventEnvelope<serde_json::Value> = EventEnvelope::new(
            "passport.deleted",
            "R9",
            None,
            "U2",
            "passport-registry",
            "0.3.0",
        );

        let n = render(&envelope, "http://localhost:8082", "ops@example.com");
        assert_eq!(n.subject, "[Battery Passport] passport.deleted");
        assert!(n.body.contains("Record: R9"));
        assert!(!n.body.contains("null"));
    }
}
