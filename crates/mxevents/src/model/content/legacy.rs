//! Content from deprecated protocol revisions.
//!
//! These types only exist so that historical events still decode into
//! something typed. New events should never be built from them.

use crate::codec::fields::{FieldReader, FieldWriter};
use crate::model::content::{Binding, ContentFamily, EventContent, EventKind};
use crate::model::record::Record;
use crate::model::shape::{FieldKind, FieldShape, Shape};
use crate::model::JsonObject;

static ALIASES_SHAPE: Shape = Shape {
    name: "RoomAliasesEventContent",
    parent: None,
    fields: &[FieldShape::new("aliases", FieldKind::List(&FieldKind::Scalar))],
};

/// `m.room.aliases`, removed in room version 6 in favour of
/// `m.room.canonical_alias`. `state_key` is the server name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomAliasesEventContent {
    pub aliases: Option<Vec<String>>,
    pub extra: JsonObject,
}

impl Record for RoomAliasesEventContent {
    fn shape() -> &'static Shape {
        &ALIASES_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            aliases: fields.take("aliases"),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("aliases", &self.aliases);
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

impl EventContent for RoomAliasesEventContent {
    const BINDINGS: &'static [Binding] = &[Binding::legacy("m.room.aliases")];
    const FAMILY: ContentFamily = ContentFamily::Legacy;
    const KIND: EventKind = EventKind::State;
}
