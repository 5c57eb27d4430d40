//! JSON decoding and encoding for event content and whole events.
//!
//! Decoding is lossless: every key a model does not declare, or whose value
//! does not fit the declared type, is kept as residue and written back on
//! encode.

pub mod content;
pub mod event;
pub mod fields;

pub use content::{
    decode_content, decode_content_with_options, encode_content, Content, KnownContent,
    UnknownContent,
};
pub use event::{decode_event, decode_event_slice, decode_event_with_options, Event};
pub use fields::{DecodeOptions, FieldReader, FieldWriter};
