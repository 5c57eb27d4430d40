//! The `m.relates_to` block.

use crate::codec::fields::{FieldReader, FieldWriter};
use crate::model::record::Record;
use crate::model::shape::{FieldKind, FieldShape, Shape};
use crate::model::JsonObject;

/// Wire key of the relation block inside content.
pub const RELATES_TO: &str = "m.relates_to";

/// Relation type for edits.
pub const REL_REPLACE: &str = "m.replace";
/// Relation type for reactions.
pub const REL_ANNOTATION: &str = "m.annotation";
/// Relation type for threads.
pub const REL_THREAD: &str = "m.thread";

static RELATES_TO_SHAPE: Shape = Shape {
    name: "RelatesTo",
    parent: None,
    fields: &[
        FieldShape::scalar("rel_type"),
        FieldShape::scalar("event_id"),
        FieldShape::scalar("key"),
        FieldShape::scalar("is_falling_back"),
        FieldShape::new("m.in_reply_to", FieldKind::Record(InReplyTo::shape)),
    ],
};

static IN_REPLY_TO_SHAPE: Shape = Shape {
    name: "InReplyTo",
    parent: None,
    fields: &[FieldShape::scalar("event_id")],
};

/// A pointer from one event to another.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelatesTo {
    /// Relation type (`m.replace`, `m.annotation`, `m.thread`, ...).
    pub rel_type: Option<String>,
    /// The related event.
    pub event_id: Option<String>,
    /// Annotation key (reactions).
    pub key: Option<String>,
    /// Thread fallback marker.
    pub is_falling_back: Option<bool>,
    /// Reply pointer.
    pub in_reply_to: Option<InReplyTo>,
    pub extra: JsonObject,
}

impl RelatesTo {
    /// A relation of `rel_type` pointing at `event_id`.
    pub fn new(rel_type: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            rel_type: Some(rel_type.into()),
            event_id: Some(event_id.into()),
            ..Self::default()
        }
    }

    /// An edit relation.
    pub fn replace(event_id: impl Into<String>) -> Self {
        Self::new(REL_REPLACE, event_id)
    }

    /// A reaction relation with its annotation key.
    pub fn annotation(event_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(REL_ANNOTATION, event_id)
        }
    }

    /// A plain reply.
    pub fn reply(event_id: impl Into<String>) -> Self {
        Self {
            in_reply_to: Some(InReplyTo::new(event_id)),
            ..Self::default()
        }
    }

    pub fn is_replace(&self) -> bool {
        self.rel_type.as_deref() == Some(REL_REPLACE)
    }

    /// Returns the replied-to event id, if this is (also) a reply.
    pub fn reply_target(&self) -> Option<&str> {
        self.in_reply_to.as_ref()?.event_id.as_deref()
    }
}

impl Record for RelatesTo {
    fn shape() -> &'static Shape {
        &RELATES_TO_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            rel_type: fields.take("rel_type"),
            event_id: fields.take("event_id"),
            key: fields.take("key"),
            is_falling_back: fields.take("is_falling_back"),
            in_reply_to: fields.take_record("m.in_reply_to"),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("rel_type", &self.rel_type);
        out.put("event_id", &self.event_id);
        out.put("key", &self.key);
        out.put("is_falling_back", &self.is_falling_back);
        out.put_record("m.in_reply_to", self.in_reply_to.as_ref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

/// The `m.in_reply_to` pointer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InReplyTo {
    pub event_id: Option<String>,
    pub extra: JsonObject,
}

impl InReplyTo {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            extra: JsonObject::new(),
        }
    }
}

impl Record for InReplyTo {
    fn shape() -> &'static Shape {
        &IN_REPLY_TO_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            event_id: fields.take("event_id"),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("event_id", &self.event_id);
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
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
    fn test_reply_round_trip_keeps_unknown_keys() {
        let raw = object(json!({
            "m.in_reply_to": {"event_id": "$parent", "x.hint": 1},
            "rel_type": "m.thread",
            "event_id": "$root",
            "is_falling_back": true,
            "x.future": "kept"
        }));
        let relation = RelatesTo::from_object(raw.clone());
        assert_eq!(relation.reply_target(), Some("$parent"));
        assert_eq!(relation.rel_type.as_deref(), Some(REL_THREAD));
        assert_eq!(relation.extra.len(), 1);
        assert_eq!(relation.to_object(), raw);
    }

    #[test]
    fn test_constructors() {
        let edit = RelatesTo::replace("$abc");
        assert!(edit.is_replace());
        assert_eq!(edit.event_id.as_deref(), Some("$abc"));

        let reaction = RelatesTo::annotation("$abc", "👍");
        assert_eq!(
            Value::Object(reaction.to_object()),
            json!({"rel_type": "m.annotation", "event_id": "$abc", "key": "👍"})
        );

        let reply = RelatesTo::reply("$abc");
        assert!(!reply.is_replace());
        assert_eq!(
            Value::Object(reply.to_object()),
            json!({"m.in_reply_to": {"event_id": "$abc"}})
        );
    }
}
