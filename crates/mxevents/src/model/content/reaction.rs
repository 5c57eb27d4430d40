//! `m.reaction` content.

use crate::codec::fields::{FieldReader, FieldWriter};
use crate::model::content::{
    Binding, ContentFamily, EventContent, EventKind, HasRelation, RELATES_TO,
    RELATION_CONTENT_SHAPE, RelatesTo,
};
use crate::model::record::Record;
use crate::model::shape::Shape;
use crate::model::JsonObject;

static SHAPE: Shape = Shape {
    name: "ReactionEventContent",
    parent: Some(&RELATION_CONTENT_SHAPE),
    fields: &[],
};

/// A reaction. Everything meaningful lives in the `m.annotation` relation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReactionEventContent {
    pub relates_to: Option<RelatesTo>,
    pub extra: JsonObject,
}

impl ReactionEventContent {
    pub fn new(event_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            relates_to: Some(RelatesTo::annotation(event_id, key)),
            extra: JsonObject::new(),
        }
    }

    /// The reaction key (usually an emoji).
    pub fn key(&self) -> Option<&str> {
        self.relates_to.as_ref()?.key.as_deref()
    }
}

impl Record for ReactionEventContent {
    fn shape() -> &'static Shape {
        &SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            relates_to: fields.take_record(RELATES_TO),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put_record(RELATES_TO, self.relates_to.as_ref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

impl EventContent for ReactionEventContent {
    const BINDINGS: &'static [Binding] = &[Binding::current("m.reaction")];
    const FAMILY: ContentFamily = ContentFamily::Bare;
    const KIND: EventKind = EventKind::Message;

    fn relation(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }
}

impl HasRelation for ReactionEventContent {
    fn relates_to(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }

    fn relates_to_mut(&mut self) -> &mut Option<RelatesTo> {
        &mut self.relates_to
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn test_reaction_encoding() {
        let reaction = ReactionEventContent::new("$target", "🎉");
        assert_eq!(reaction.key(), Some("🎉"));
        assert_eq!(reaction.relation_type(), Some("m.annotation"));
        assert_eq!(
            Value::Object(reaction.to_object()),
            json!({"m.relates_to": {"rel_type": "m.annotation", "event_id": "$target", "key": "🎉"}})
        );
    }
}
