//! Data model types for Matrix events.
//!
//! This module contains:
//! - Declared shapes (which wire keys a model owns)
//! - The record contract (typed fields plus residue)
//! - The event envelope
//! - Content variants and their capability traits

pub mod content;
pub mod envelope;
pub mod record;
pub mod shape;

/// A JSON object as it appears on the wire.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

pub use content::legacy::RoomAliasesEventContent;
pub use content::message::RoomMessageEventContent;
pub use content::poll::{PollAnswer, PollBlock, PollQuestion, PollStartEventContent, TextRepresentation};
pub use content::reaction::ReactionEventContent;
pub use content::redaction::RoomRedactionEventContent;
pub use content::state::{
    Membership, RoomCanonicalAliasEventContent, RoomMemberEventContent, RoomNameEventContent,
    RoomPowerLevelsEventContent, RoomTopicEventContent,
};
pub use content::{
    AnyContent, Binding, ContentFamily, EventContent, EventKind, HasEditSupport, HasRelation,
    InReplyTo, RelatesTo,
};
pub use envelope::{new_transaction_id, Envelope, Unsigned, EVENT_SHAPE};
pub use record::Record;
pub use shape::{FieldKind, FieldShape, Shape, ShapeFn};
