//! Whole-event decoding: envelope plus typed content.

use serde_json::Value;

use crate::codec::content::{decode_content_with_options, encode_content, Content};
use crate::codec::fields::DecodeOptions;
use crate::error::DecodeError;
use crate::model::content::{EventContent, EventKind};
use crate::model::envelope::{new_transaction_id, Envelope, CONTENT};
use crate::model::record::Record;
use crate::registry::Registry;

/// A decoded event.
#[derive(Debug, Clone)]
pub struct Event {
    pub envelope: Envelope,
    pub content: Content,
}

impl Event {
    /// Pairs an envelope with content. The envelope's `type` is written as
    /// given; it is not checked against the content.
    pub fn new(envelope: Envelope, content: Content) -> Self {
        Self { envelope, content }
    }

    /// A not-yet-sent event with a fresh transaction id.
    pub fn local<T: EventContent>(content: T) -> Self {
        let envelope = Envelope::local(T::wire_type(), new_transaction_id());
        Self::new(envelope, Content::new(content))
    }

    /// A not-yet-sent state event with a fresh transaction id.
    pub fn local_state<T: EventContent>(content: T, state_key: impl Into<String>) -> Self {
        let envelope = Envelope::local_state(T::wire_type(), state_key, new_transaction_id());
        Self::new(envelope, Content::new(content))
    }

    pub fn event_type(&self) -> &str {
        self.envelope.event_type()
    }

    pub fn event_id(&self) -> Option<&str> {
        self.envelope.event_id.as_deref()
    }

    pub fn state_key(&self) -> Option<&str> {
        self.envelope.state_key.as_deref()
    }

    pub fn is_state(&self) -> bool {
        self.envelope.is_state()
    }

    /// Content this state event replaced, decoded with the event's own type.
    pub fn prev_content(&self, registry: &Registry) -> Option<Content> {
        let prev = self.envelope.unsigned.as_ref()?.prev_content.clone()?;
        let mut content = decode_content_with_options(
            registry,
            self.event_type(),
            Value::Object(prev),
            DecodeOptions::default(),
        );
        tag_unknown_kind(&mut content, &self.envelope);
        Some(content)
    }

    /// The redaction event that removed this event's content, if any.
    pub fn redacted_because(&self, registry: &Registry) -> Result<Option<Event>, DecodeError> {
        match self.envelope.unsigned.as_ref().and_then(|u| u.redacted_because.clone()) {
            Some(redaction) => decode_event(registry, Value::Object(redaction)).map(Some),
            None => Ok(None),
        }
    }

    /// Encodes the event back to its wire tree.
    pub fn to_json(&self) -> Value {
        let mut object = self.envelope.to_object();
        object.insert(CONTENT.to_string(), encode_content(&self.content));
        Value::Object(object)
    }
}

/// Decodes an event tree.
///
/// Fails only when the tree is not an object, or `type` or `content` is
/// missing or malformed. Content itself always decodes.
pub fn decode_event(registry: &Registry, tree: Value) -> Result<Event, DecodeError> {
    decode_event_with_options(registry, tree, DecodeOptions::default())
}

pub fn decode_event_with_options(
    registry: &Registry,
    tree: Value,
    options: DecodeOptions,
) -> Result<Event, DecodeError> {
    let Value::Object(mut object) = tree else {
        return Err(DecodeError::NotAnObject { context: "event" });
    };

    match object.get("type") {
        None => return Err(DecodeError::MissingField { field: "type" }),
        Some(Value::String(_)) => {}
        Some(_) => return Err(DecodeError::NotAString { field: "type" }),
    }
    let Some(raw_content) = object.remove(CONTENT) else {
        return Err(DecodeError::MissingField { field: CONTENT });
    };

    let envelope = Envelope::from_object_with_options(object, options);
    let mut content =
        decode_content_with_options(registry, envelope.event_type(), raw_content, options);

    let envelope_kind = EventKind::from_state_key(envelope.state_key.as_deref());
    match &content {
        Content::Known(known) if known.variant().kind() != envelope_kind => {
            tracing::warn!(
                event_type = envelope.event_type(),
                event_id = envelope.event_id.as_deref().unwrap_or_default(),
                registered = ?known.variant().kind(),
                envelope = ?envelope_kind,
                "event kind disagrees with registered content kind"
            );
        }
        _ => {}
    }
    tag_unknown_kind(&mut content, &envelope);

    Ok(Event { envelope, content })
}

/// Decodes an event from JSON bytes.
pub fn decode_event_slice(registry: &Registry, bytes: &[u8]) -> Result<Event, DecodeError> {
    let tree: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    decode_event(registry, tree)
}

fn tag_unknown_kind(content: &mut Content, envelope: &Envelope) {
    if let Content::Unknown(unknown) = content {
        unknown.kind = Some(EventKind::from_state_key(envelope.state_key.as_deref()));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::content::message::RoomMessageEventContent;
    use crate::model::content::state::{RoomNameEventContent, RoomTopicEventContent};

    fn registry() -> Registry {
        Registry::builtin().unwrap()
    }

    #[test]
    fn test_event_round_trip() {
        let tree = json!({
            "type": "m.room.message",
            "event_id": "$ev",
            "room_id": "!room:example.org",
            "sender": "@alice:example.org",
            "origin_server_ts": 1700000000000u64,
            "unsigned": {"age": 5},
            "content": {"msgtype": "m.text", "body": "hi", "x.custom": [1, 2]},
            "x.envelope.extension": true
        });
        let event = decode_event(&registry(), tree.clone()).unwrap();
        assert_eq!(event.event_id(), Some("$ev"));
        let message = event.content.downcast_ref::<RoomMessageEventContent>().unwrap();
        assert_eq!(message.body.as_deref(), Some("hi"));
        assert_eq!(event.to_json(), tree);
    }

    #[test]
    fn test_structural_errors() {
        let registry = registry();
        assert_eq!(
            decode_event(&registry, json!([])).unwrap_err(),
            DecodeError::NotAnObject { context: "event" }
        );
        assert_eq!(
            decode_event(&registry, json!({"content": {}})).unwrap_err(),
            DecodeError::MissingField { field: "type" }
        );
        assert_eq!(
            decode_event(&registry, json!({"type": 7, "content": {}})).unwrap_err(),
            DecodeError::NotAString { field: "type" }
        );
        assert_eq!(
            decode_event(&registry, json!({"type": "m.room.name"})).unwrap_err(),
            DecodeError::MissingField { field: "content" }
        );
        assert!(matches!(
            decode_event_slice(&registry, b"{not json").unwrap_err(),
            DecodeError::InvalidJson(_)
        ));
    }

    #[test]
    fn test_unknown_content_records_kind() {
        let event = decode_event(
            &registry(),
            json!({"type": "org.example.custom", "state_key": "", "content": {"a": 1}}),
        )
        .unwrap();
        assert!(!event.content.is_known());
        assert_eq!(event.content.kind(), Some(EventKind::State));
        assert_eq!(event.content.unknown_fields().and_then(|f| f.get("a")), Some(&json!(1)));
    }

    #[test]
    fn test_kind_mismatch_still_decodes() {
        // m.room.name sent without a state_key.
        let event = decode_event(
            &registry(),
            json!({"type": "m.room.name", "content": {"name": "Lobby"}}),
        )
        .unwrap();
        assert!(!event.is_state());
        let name = event.content.downcast_ref::<RoomNameEventContent>().unwrap();
        assert_eq!(name.name.as_deref(), Some("Lobby"));
    }

    #[test]
    fn test_prev_content() {
        let registry = registry();
        let event = decode_event(
            &registry,
            json!({
                "type": "m.room.topic",
                "state_key": "",
                "content": {"topic": "new"},
                "unsigned": {"prev_content": {"topic": "old"}, "replaces_state": "$prev"}
            }),
        )
        .unwrap();
        let prev = event.prev_content(&registry).unwrap();
        let topic = prev.downcast_ref::<RoomTopicEventContent>().unwrap();
        assert_eq!(topic.topic.as_deref(), Some("old"));
    }

    #[test]
    fn test_redacted_because() {
        let registry = registry();
        let event = decode_event(
            &registry,
            json!({
                "type": "m.room.message",
                "content": {},
                "unsigned": {"redacted_because": {
                    "type": "m.room.redaction",
                    "redacts": "$target",
                    "content": {"reason": "spam"}
                }}
            }),
        )
        .unwrap();
        let redaction = event.redacted_because(&registry).unwrap().unwrap();
        assert_eq!(redaction.event_type(), "m.room.redaction");
        assert!(redaction.envelope.extra.contains_key("redacts"));
    }

    #[test]
    fn test_local_state_event() {
        let event = Event::local_state(RoomNameEventContent::new("Lobby"), "");
        assert!(event.is_state());
        assert!(event.envelope.transaction_id().is_some());
        let json = event.to_json();
        assert_eq!(json["type"], json!("m.room.name"));
        assert_eq!(json["state_key"], json!(""));
        assert_eq!(json["content"], json!({"name": "Lobby"}));
    }
}
