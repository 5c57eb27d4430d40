//! Room state content.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::fields::{FieldReader, FieldWriter};
use crate::model::content::{
    Binding, ContentFamily, EventContent, EventKind, HasRelation, RELATES_TO,
    RELATION_CONTENT_SHAPE, RelatesTo,
};
use crate::model::record::Record;
use crate::model::shape::{FieldKind, FieldShape, Shape};
use crate::model::JsonObject;

// =============================================================================
// m.room.member
// =============================================================================

static MEMBER_SHAPE: Shape = Shape {
    name: "RoomMemberEventContent",
    parent: Some(&RELATION_CONTENT_SHAPE),
    fields: &[
        FieldShape::scalar("membership"),
        FieldShape::scalar("displayname"),
        FieldShape::scalar("avatar_url"),
        FieldShape::scalar("reason"),
        FieldShape::scalar("is_direct"),
    ],
};

/// Membership states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Invite,
    Join,
    Knock,
    Leave,
    Ban,
}

/// A user's membership in a room. `state_key` is the user id.
///
/// A `membership` value from a future protocol revision does not parse and
/// stays in residue, so it still round-trips.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomMemberEventContent {
    pub membership: Option<Membership>,
    pub displayname: Option<String>,
    pub avatar_url: Option<String>,
    pub reason: Option<String>,
    pub is_direct: Option<bool>,
    pub relates_to: Option<RelatesTo>,
    pub extra: JsonObject,
}

impl RoomMemberEventContent {
    pub fn new(membership: Membership) -> Self {
        Self {
            membership: Some(membership),
            ..Self::default()
        }
    }
}

impl Record for RoomMemberEventContent {
    fn shape() -> &'static Shape {
        &MEMBER_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            membership: fields.take("membership"),
            displayname: fields.take("displayname"),
            avatar_url: fields.take("avatar_url"),
            reason: fields.take("reason"),
            is_direct: fields.take("is_direct"),
            relates_to: fields.take_record(RELATES_TO),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("membership", &self.membership);
        out.put("displayname", &self.displayname);
        out.put("avatar_url", &self.avatar_url);
        out.put("reason", &self.reason);
        out.put("is_direct", &self.is_direct);
        out.put_record(RELATES_TO, self.relates_to.as_ref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

impl EventContent for RoomMemberEventContent {
    const BINDINGS: &'static [Binding] = &[Binding::current("m.room.member")];
    const FAMILY: ContentFamily = ContentFamily::Bare;
    const KIND: EventKind = EventKind::State;

    fn relation(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }
}

impl HasRelation for RoomMemberEventContent {
    fn relates_to(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }

    fn relates_to_mut(&mut self) -> &mut Option<RelatesTo> {
        &mut self.relates_to
    }
}

// =============================================================================
// m.room.name / m.room.topic
// =============================================================================

static NAME_SHAPE: Shape = Shape {
    name: "RoomNameEventContent",
    parent: Some(&RELATION_CONTENT_SHAPE),
    fields: &[FieldShape::scalar("name")],
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomNameEventContent {
    pub name: Option<String>,
    pub relates_to: Option<RelatesTo>,
    pub extra: JsonObject,
}

impl RoomNameEventContent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl Record for RoomNameEventContent {
    fn shape() -> &'static Shape {
        &NAME_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            name: fields.take("name"),
            relates_to: fields.take_record(RELATES_TO),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("name", &self.name);
        out.put_record(RELATES_TO, self.relates_to.as_ref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

impl EventContent for RoomNameEventContent {
    const BINDINGS: &'static [Binding] = &[Binding::current("m.room.name")];
    const FAMILY: ContentFamily = ContentFamily::Bare;
    const KIND: EventKind = EventKind::State;

    fn relation(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }
}

impl HasRelation for RoomNameEventContent {
    fn relates_to(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }

    fn relates_to_mut(&mut self) -> &mut Option<RelatesTo> {
        &mut self.relates_to
    }
}

static TOPIC_SHAPE: Shape = Shape {
    name: "RoomTopicEventContent",
    parent: Some(&RELATION_CONTENT_SHAPE),
    fields: &[FieldShape::scalar("topic")],
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomTopicEventContent {
    pub topic: Option<String>,
    pub relates_to: Option<RelatesTo>,
    pub extra: JsonObject,
}

impl RoomTopicEventContent {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::default()
        }
    }
}

impl Record for RoomTopicEventContent {
    fn shape() -> &'static Shape {
        &TOPIC_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            topic: fields.take("topic"),
            relates_to: fields.take_record(RELATES_TO),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("topic", &self.topic);
        out.put_record(RELATES_TO, self.relates_to.as_ref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

impl EventContent for RoomTopicEventContent {
    const BINDINGS: &'static [Binding] = &[Binding::current("m.room.topic")];
    const FAMILY: ContentFamily = ContentFamily::Bare;
    const KIND: EventKind = EventKind::State;

    fn relation(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }
}

impl HasRelation for RoomTopicEventContent {
    fn relates_to(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }

    fn relates_to_mut(&mut self) -> &mut Option<RelatesTo> {
        &mut self.relates_to
    }
}

// =============================================================================
// m.room.canonical_alias
// =============================================================================

static CANONICAL_ALIAS_SHAPE: Shape = Shape {
    name: "RoomCanonicalAliasEventContent",
    parent: Some(&RELATION_CONTENT_SHAPE),
    fields: &[
        FieldShape::scalar("alias"),
        FieldShape::new("alt_aliases", FieldKind::List(&FieldKind::Scalar)),
    ],
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomCanonicalAliasEventContent {
    pub alias: Option<String>,
    pub alt_aliases: Option<Vec<String>>,
    pub relates_to: Option<RelatesTo>,
    pub extra: JsonObject,
}

impl Record for RoomCanonicalAliasEventContent {
    fn shape() -> &'static Shape {
        &CANONICAL_ALIAS_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            alias: fields.take("alias"),
            alt_aliases: fields.take("alt_aliases"),
            relates_to: fields.take_record(RELATES_TO),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("alias", &self.alias);
        out.put("alt_aliases", &self.alt_aliases);
        out.put_record(RELATES_TO, self.relates_to.as_ref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

impl EventContent for RoomCanonicalAliasEventContent {
    const BINDINGS: &'static [Binding] = &[Binding::current("m.room.canonical_alias")];
    const FAMILY: ContentFamily = ContentFamily::Bare;
    const KIND: EventKind = EventKind::State;

    fn relation(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }
}

impl HasRelation for RoomCanonicalAliasEventContent {
    fn relates_to(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }

    fn relates_to_mut(&mut self) -> &mut Option<RelatesTo> {
        &mut self.relates_to
    }
}

// =============================================================================
// m.room.power_levels
// =============================================================================

const LEVEL_MAP: FieldKind = FieldKind::Map(&FieldKind::Scalar);

static POWER_LEVELS_SHAPE: Shape = Shape {
    name: "RoomPowerLevelsEventContent",
    parent: Some(&RELATION_CONTENT_SHAPE),
    fields: &[
        FieldShape::scalar("ban"),
        FieldShape::scalar("invite"),
        FieldShape::scalar("kick"),
        FieldShape::scalar("redact"),
        FieldShape::scalar("events_default"),
        FieldShape::scalar("state_default"),
        FieldShape::scalar("users_default"),
        FieldShape::new("events", LEVEL_MAP),
        FieldShape::new("users", LEVEL_MAP),
        FieldShape::new("notifications", LEVEL_MAP),
    ],
};

/// Default level required for most moderation actions.
pub const DEFAULT_MODERATOR_LEVEL: i64 = 50;

/// Power levels. Unset fields take the protocol defaults via the accessors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomPowerLevelsEventContent {
    pub ban: Option<i64>,
    pub invite: Option<i64>,
    pub kick: Option<i64>,
    pub redact: Option<i64>,
    pub events_default: Option<i64>,
    pub state_default: Option<i64>,
    pub users_default: Option<i64>,
    pub events: Option<BTreeMap<String, i64>>,
    pub users: Option<BTreeMap<String, i64>>,
    pub notifications: Option<BTreeMap<String, i64>>,
    pub relates_to: Option<RelatesTo>,
    pub extra: JsonObject,
}

impl RoomPowerLevelsEventContent {
    /// Power level of `user_id`.
    pub fn user_level(&self, user_id: &str) -> i64 {
        self.users
            .as_ref()
            .and_then(|users| users.get(user_id).copied())
            .unwrap_or(self.users_default.unwrap_or(0))
    }

    /// Level required to send `event_type` (as state if `state` is true).
    pub fn event_level(&self, event_type: &str, state: bool) -> i64 {
        let fallback = if state {
            self.state_default.unwrap_or(DEFAULT_MODERATOR_LEVEL)
        } else {
            self.events_default.unwrap_or(0)
        };
        self.events
            .as_ref()
            .and_then(|events| events.get(event_type).copied())
            .unwrap_or(fallback)
    }
}

impl Record for RoomPowerLevelsEventContent {
    fn shape() -> &'static Shape {
        &POWER_LEVELS_SHAPE
    }

    fn read_fields(fields: &mut FieldReader) -> Self {
        Self {
            ban: fields.take("ban"),
            invite: fields.take("invite"),
            kick: fields.take("kick"),
            redact: fields.take("redact"),
            events_default: fields.take("events_default"),
            state_default: fields.take("state_default"),
            users_default: fields.take("users_default"),
            events: fields.take("events"),
            users: fields.take("users"),
            notifications: fields.take("notifications"),
            relates_to: fields.take_record(RELATES_TO),
            extra: fields.take_residue(),
        }
    }

    fn write_fields(&self, out: &mut FieldWriter) {
        out.put("ban", &self.ban);
        out.put("invite", &self.invite);
        out.put("kick", &self.kick);
        out.put("redact", &self.redact);
        out.put("events_default", &self.events_default);
        out.put("state_default", &self.state_default);
        out.put("users_default", &self.users_default);
        out.put("events", &self.events);
        out.put("users", &self.users);
        out.put("notifications", &self.notifications);
        out.put_record(RELATES_TO, self.relates_to.as_ref());
    }

    fn residue(&self) -> &JsonObject {
        &self.extra
    }
}

impl EventContent for RoomPowerLevelsEventContent {
    const BINDINGS: &'static [Binding] = &[Binding::current("m.room.power_levels")];
    const FAMILY: ContentFamily = ContentFamily::Bare;
    const KIND: EventKind = EventKind::State;

    fn relation(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }
}

impl HasRelation for RoomPowerLevelsEventContent {
    fn relates_to(&self) -> Option<&RelatesTo> {
        self.relates_to.as_ref()
    }

    fn relates_to_mut(&mut self) -> &mut Option<RelatesTo> {
        &mut self.relates_to
    }
}
