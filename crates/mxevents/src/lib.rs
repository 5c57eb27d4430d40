//! mxevents: Matrix event-content registry and lossless polymorphic codec.
//!
//! This crate turns loosely-typed Matrix event JSON into strongly typed
//! content and back again without losing fields it does not model.
//!
//! # Overview
//!
//! - **Registry**: wire type names (`m.room.message`, unstable aliases,
//!   deprecated names) map to concrete content types. Built once, checked for
//!   conflicts, immutable afterwards.
//! - **Codec**: content decodes into its registered type. Keys the type does
//!   not declare, and values that do not fit a declared field, are kept as
//!   residue and written back on encode. Unregistered types decode to
//!   [`Content::Unknown`] and re-encode unchanged.
//! - **Collection**: [`EventList`] holds events of mixed content types.
//! - **Drift validation**: [`validate::SchemaContext`] reports every key
//!   path a payload carries that its model does not declare.
//!
//! # Quick Start
//!
//! ```rust
//! use mxevents::{decode_event, Registry, RoomMessageEventContent, HasEditSupport};
//! use serde_json::json;
//!
//! let registry = Registry::builtin().unwrap();
//! let tree = json!({
//!     "type": "m.room.message",
//!     "event_id": "$ev",
//!     "content": {"msgtype": "m.text", "body": "hello", "x.custom": 1}
//! });
//!
//! let mut event = decode_event(&registry, tree).unwrap();
//! let message = event.content.downcast_mut::<RoomMessageEventContent>().unwrap();
//! assert_eq!(message.body.as_deref(), Some("hello"));
//!
//! // Turn it into an edit of another event.
//! message.set_replace_relation("$original");
//!
//! let out = event.to_json();
//! assert_eq!(out["content"]["x.custom"], json!(1));
//! assert_eq!(out["content"]["m.new_content"]["body"], json!("hello"));
//! assert_eq!(out["content"]["m.relates_to"]["rel_type"], json!("m.replace"));
//! ```
//!
//! # Modules
//!
//! - [`model`]: envelope, shapes, content variants and capability traits
//! - [`registry`]: the type registry and its process-wide instance
//! - [`codec`]: content and event decoding/encoding
//! - [`collection`]: heterogeneous event list
//! - [`validate`]: schema-drift validation
//! - [`error`]: error types
//! - [`limits`]: nesting bounds and envelope-reserved names

pub mod codec;
pub mod collection;
pub mod error;
pub mod limits;
pub mod model;
pub mod registry;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{
    decode_content, decode_event, decode_event_slice, encode_content, Content, DecodeOptions,
    Event,
};
pub use collection::EventList;
pub use error::{DecodeError, ErrorCode, RegistryError, ValidationError};
pub use model::{
    AnyContent, ContentFamily, Envelope, EventContent, EventKind, HasEditSupport, HasRelation,
    JsonObject, Membership, PollStartEventContent, ReactionEventContent, Record, RelatesTo,
    RoomAliasesEventContent, RoomCanonicalAliasEventContent, RoomMemberEventContent,
    RoomMessageEventContent, RoomNameEventContent, RoomPowerLevelsEventContent,
    RoomRedactionEventContent, RoomTopicEventContent, Unsigned,
};
pub use registry::{Registry, RegistryBuilder, Variant};
pub use validate::{find_extra_fields, DriftReport, SchemaContext, ValidateOptions};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
