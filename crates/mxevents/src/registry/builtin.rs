//! Content types shipped with this crate.

use super::Variant;
use crate::model::content::legacy::RoomAliasesEventContent;
use crate::model::content::message::RoomMessageEventContent;
use crate::model::content::poll::PollStartEventContent;
use crate::model::content::reaction::ReactionEventContent;
use crate::model::content::redaction::RoomRedactionEventContent;
use crate::model::content::state::{
    RoomCanonicalAliasEventContent, RoomMemberEventContent, RoomNameEventContent,
    RoomPowerLevelsEventContent, RoomTopicEventContent,
};

/// Every builtin content variant, in registration order.
pub fn builtin_variants() -> Vec<Variant> {
    vec![
        // Timeline
        Variant::of::<RoomMessageEventContent>(),
        Variant::of::<PollStartEventContent>(),
        Variant::of::<ReactionEventContent>(),
        Variant::of::<RoomRedactionEventContent>(),
        // State
        Variant::of::<RoomMemberEventContent>(),
        Variant::of::<RoomNameEventContent>(),
        Variant::of::<RoomTopicEventContent>(),
        Variant::of::<RoomCanonicalAliasEventContent>(),
        Variant::of::<RoomPowerLevelsEventContent>(),
        // Legacy
        Variant::of::<RoomAliasesEventContent>(),
    ]
}
