//! Bounds applied to untrusted event payloads.

/// Maximum object/array nesting the codec and validator will descend into.
///
/// Matrix payloads are shallow; anything deeper is either hostile or broken.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Top-level keys owned by the event envelope.
///
/// Content variants may not declare fields with these wire names.
pub const ENVELOPE_RESERVED: &[&str] = &[
    "type",
    "state_key",
    "event_id",
    "room_id",
    "sender",
    "origin_server_ts",
    "unsigned",
    "content",
];

/// Returns true if `name` is reserved by the event envelope.
pub fn is_envelope_reserved(name: &str) -> bool {
    ENVELOPE_RESERVED.contains(&name)
}
