//! The event envelope: everything around `content`.

use uuid::Uuid;

use crate::codec::fields::{FieldReader, FieldWriter};
use crate::model::content::fallback_content_shape;
use crate::model::record::Record;
use crate::model::shape::{FieldKind, FieldShape, Shape};
use crate::model::JsonObject;

/// Wire key of the content payload.
pub const CONTENT: &str = "content";

static ENVELOPE_SHAPE: Shape = Shape {
    name: "Envelope",
    parent: None,
    fields: &[
        FieldShape::scalar("type"),
        FieldShape::scalar("state_key"),
        FieldShape::scalar("event_id"),
        FieldShape::scalar("room_id"),
        FieldShape::scalar("sender"),
        FieldShape::scalar("origin_server_ts"),
        FieldShape::new("unsigned", FieldKind::Record(Unsigned::shape)),
    ],
};

/// Shape of a whole event: the envelope plus its content, typed by `type`.
pub static EVENT_SHAPE: Shape = Shape {
    name: "Event",
    parent: Some(&ENVELOPE_SHAPE),
    fields: &[FieldShape::new(
        CONTENT,
        FieldKind::Content {
            discriminator: "type",
            fallback: fallback_content_shape,
        },
    )],
};

fn event_shape() -> &'static Shape {
    &EVENT_SHAPE
}

static UNSIGNED_SHAPE: Shape = Shape {
    name: "Unsigned",
    parent: None,
    fields: &[
        FieldShape::scalar("age"),
        FieldShape::new("redacted_because", FieldKind::Record(event_shape)),
        FieldShape::scalar("transaction_id"),
        FieldShape::scalar("prev_sender"),
        FieldShape::new(
            "prev_content",
            FieldKind::Content {
                discriminator: "type",
                fallback: fallback_content_shape,
            },
        ),
        FieldShape::scalar("replaces_state"),
    ],
};

/// Envelope fields of an event. `content` is not part of the envelope; the
/// codec owns it.
///
/// Events built locally have no `event_id`, `room_id`, `sender` or
/// `origin_server_ts` until the server accepts them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope {
    pub event_type: Option<String>,
    /// Present for state events. `""` is a valid state key.
    pub state_key: Option<String>,
    pub event_id: Option<String>,
    pub room_id: Option<String>,
    pub sender: Option<String>,
    pub origin_server_ts: Option<u64>,
    pub unsigned: Option<Unsigned>,
    pub extra: JsonObject,
}

impl Envelope {
    /// Envelope for a not-yet-sent event.
    pub fn local(event_type: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            unsigned: Some(Unsigned {
                transaction_id: Some(transaction_id.into()),
                ..Unsigned::default()
            }),
            ..Self::default()
        }
    }

    /// Envelope for a not-yet-sent state event.
    pub fn local_state(
        event_type: impl Into<String>,
        state_key: impl Into<String>,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            state_key: Some(state_key.into()),
            ..Self::local(event_type, transaction_id)
        }
    }

    pub fn event_type(&self) -> &str {
        self.event_type.as_deref().unwrap_or_default()
    }

    pub fn is_state(&self) -> bool {
        self.state_key.is_some()
    }

    /// True once the server has assigned an event id.
    pub fn is_remote(&self) -> bool {
        self.event_id.is_some()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.unsigned.as_ref()?.transaction_id.as_deref()
    }
}

impl Record for Envelope {
    fn shape() -> &'static Shape {
        &ENVELOPE_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            event_type: fields.take("type"),
            state_key: fields.take("state_key"),
            event_id: fields.take("event_id"),
            room_id: fields.take("room_id"),
            sender: fields.take("sender"),
            origin_server_ts: fields.take("origin_server_ts"),
            unsigned: fields.take_record("unsigned"),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("type", &self.event_type);
        out.put("state_key", &self.state_key);
        out.put("event_id", &self.event_id);
        out.put("room_id", &self.room_id);
        out.put("sender", &self.sender);
        out.put("origin_server_ts", &self.origin_server_ts);
        out.put_record("unsigned", self.unsigned.as_ref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

/// Server-side annotations. Every field is independently optional.
///
/// `redacted_because` and `prev_content` are kept as raw objects; the
/// codec decodes them on demand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Unsigned {
    pub age: Option<i64>,
    pub redacted_because: Option<JsonObject>,
    pub transaction_id: Option<String>,
    pub prev_sender: Option<String>,
    pub prev_content: Option<JsonObject>,
    pub replaces_state: Option<String>,
    pub extra: JsonObject,
}

impl Record for Unsigned {
    fn shape() -> &'static Shape {
        &UNSIGNED_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            age: fields.take("age"),
            redacted_because: fields.take("redacted_because"),
            transaction_id: fields.take("transaction_id"),
            prev_sender: fields.take("prev_sender"),
            prev_content: fields.take("prev_content"),
            replaces_state: fields.take("replaces_state"),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("age", &self.age);
        out.put("redacted_because", &self.redacted_because);
        out.put("transaction_id", &self.transaction_id);
        out.put("prev_sender", &self.prev_sender);
        out.put("prev_content", &self.prev_content);
        out.put("replaces_state", &self.replaces_state);
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

/// Mints a fresh transaction id for a local echo.
pub fn new_transaction_id() -> String {
    format!("mx{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_envelope_round_trip_with_residue() {
        let raw = object(json!({
            "type": "m.room.message",
            "event_id": "$1",
            "room_id": "!r:example.org",
            "sender": "@a:example.org",
            "origin_server_ts": 1700000000000u64,
            "unsigned": {"age": 12, "m.relations": {"m.thread": {}}},
            "redacts": "$old"
        }));
        let envelope = Envelope::from_object(raw.clone());
        assert_eq!(envelope.event_type(), "m.room.message");
        assert_eq!(envelope.unsigned.as_ref().and_then(|u| u.age), Some(12));
        assert!(envelope.extra.contains_key("redacts"));
        assert_eq!(envelope.to_object(), raw);
    }

    #[test]
    fn test_empty_state_key_is_state() {
        let envelope = Envelope::from_object(object(json!({"type": "m.room.name", "state_key": ""})));
        assert!(envelope.is_state());
        assert_eq!(envelope.state_key.as_deref(), Some(""));
    }

    #[test]
    fn test_local_envelope() {
        let txn = new_transaction_id();
        let envelope = Envelope::local("m.room.message", txn.clone());
        assert!(!envelope.is_remote());
        assert!(!envelope.is_state());
        assert_eq!(envelope.transaction_id(), Some(txn.as_str()));
        assert_ne!(new_transaction_id(), txn);
    }

    #[test]
    fn test_event_shape_declares_content() {
        assert!(EVENT_SHAPE.declares("content"));
        assert!(EVENT_SHAPE.declares("unsigned"));
        assert!(!Envelope::shape().declares("content"));
    }
}
