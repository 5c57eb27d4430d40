//! `m.room.redaction` content.

use crate::codec::fields::{FieldReader, FieldWriter};
use crate::model::content::{
    Binding, ContentFamily, EventContent, EventKind, HasRelation, RELATES_TO,
    RELATION_CONTENT_SHAPE, RelatesTo,
};
use crate::model::record::Record;
use crate::model::shape::{FieldShape, Shape};
use crate::model::JsonObject;

static SHAPE: Shape = Shape {
    name: "RoomRedactionEventContent",
    parent: Some(&RELATION_CONTENT_SHAPE),
    fields: &[FieldShape::scalar("redacts"), FieldShape::scalar("reason")],
};

/// A redaction. Older room versions put `redacts` on the envelope instead;
/// there it survives as envelope residue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomRedactionEventContent {
    pub redacts: Option<String>,
    pub reason: Option<String>,
    pub relates_to: Option<RelatesTo>,
    pub extra: JsonObject,
}

impl RoomRedactionEventContent {
    pub fn new(redacts: impl Into<String>) -> Self {
        Self {
            redacts: Some(redacts.into()),
            ..Self::default()
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl Record for RoomRedactionEventContent {
    fn shape() -> &'static Shape {
        &SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            redacts: fields.take("redacts"),
            reason: fields.take("reason"),
            relates_to: fields.take_record(RELATES_TO),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("redacts", &self.redacts);
        out.put("reason", &self.reason);
        out.put_record(RELATES_TO, self.relates_to.as_ref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

impl EventContent for RoomRedactionEventContent {
    const BINDINGS: &'static [Binding] = &[Binding::current("m.room.redaction")];
    const FAMILY: ContentFamily = ContentFamily::Bare;
    const KIND: EventKind = EventKind::Message;

    fn relation(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }
}

impl HasRelation for RoomRedactionEventContent {
    fn relates_to(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }

    fn relates_to_mut(&mut self) -> &mut Option<RelatesTo> {
        &mut self.relates_to
    }
}
