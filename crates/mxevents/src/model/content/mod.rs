//! Event content variants and the capability traits they opt into.
//!
//! Every concrete content type implements [`EventContent`], which fixes its
//! wire type bindings, its family and whether it is sent as a state event.
//! Relation and edit support are separate capabilities ([`HasRelation`],
//! [`HasEditSupport`]) rather than levels of a hierarchy.

use std::any::Any;
use std::fmt;

use crate::model::record::Record;
use crate::model::shape::{FieldKind, FieldShape, Shape};
use crate::model::JsonObject;

pub mod legacy;
pub mod message;
pub mod poll;
pub mod reaction;
pub mod redaction;
pub mod relation;
pub mod state;

pub use relation::{InReplyTo, RelatesTo, REL_ANNOTATION, REL_REPLACE, REL_THREAD, RELATES_TO};

/// Wire key of the replacement payload carried by an edit.
pub const NEW_CONTENT: &str = "m.new_content";

/// Shape every relation-capable variant inherits from.
pub static RELATION_CONTENT_SHAPE: Shape = Shape {
    name: "EventContent",
    parent: None,
    fields: &[FieldShape::new(RELATES_TO, FieldKind::Record(RelatesTo::shape))],
};

/// Shape every editable variant inherits from.
pub static TIMELINE_CONTENT_SHAPE: Shape = Shape {
    name: "TimelineEventContent",
    parent: Some(&RELATION_CONTENT_SHAPE),
    fields: &[FieldShape::new(NEW_CONTENT, FieldKind::Inherit)],
};

/// Returns the shape used for content whose type is not known.
pub fn fallback_content_shape() -> &'static Shape {
    &RELATION_CONTENT_SHAPE
}

/// Content families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentFamily {
    /// Minimal content, optionally carrying a relation.
    Bare,
    /// Relation plus edit support through `m.new_content`.
    Timeline,
    /// Content defined by deprecated protocol revisions.
    Legacy,
}

/// Whether a variant is sent as a state event (with `state_key`) or as a
/// timeline message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Message,
    State,
}

impl EventKind {
    /// Kind implied by the presence of a `state_key` on the envelope.
    pub fn from_state_key(state_key: Option<&str>) -> Self {
        if state_key.is_some() {
            EventKind::State
        } else {
            EventKind::Message
        }
    }
}

/// One wire type name a variant answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    pub wire_name: &'static str,
    /// Deprecated or superseded name, kept for decoding old events.
    pub legacy: bool,
}

impl Binding {
    pub const fn current(wire_name: &'static str) -> Self {
        Self { wire_name, legacy: false }
    }

    pub const fn legacy(wire_name: &'static str) -> Self {
        Self { wire_name, legacy: true }
    }
}

/// A concrete event content type.
pub trait EventContent: Record + Clone + fmt::Debug + Send + Sync + 'static {
    /// Wire type names, stable name first. Several names may alias one type.
    const BINDINGS: &'static [Binding];
    const FAMILY: ContentFamily;
    const KIND: EventKind;

    /// The relation block, for variants that carry one.
    fn relation(&self) -> Option<&RelatesTo> {
        None
    }

    /// The wire type used when sending this content.
    fn wire_type() -> &'static str {
        preferred_wire_name(Self::BINDINGS).unwrap_or_default()
    }
}

/// The first non-legacy binding's name, or the first binding's if all are
/// legacy.
pub fn preferred_wire_name(bindings: &'static [Binding]) -> Option<&'static str> {
    bindings
        .iter()
        .find(|b| !b.legacy)
        .or_else(|| bindings.first())
        .map(|b| b.wire_name)
}

/// Capability: the content can point at another event.
pub trait HasRelation {
    fn relates_to(&self) -> Option<&RelatesTo>;

    fn relates_to_mut(&mut self) -> &mut Option<RelatesTo>;

    /// Marks this content as a reply to `event_id`, keeping any other
    /// relation data already present.
    fn set_reply_to(&mut self, event_id: impl Into<String>) {
        let relation = self.relates_to_mut().get_or_insert_with(RelatesTo::default);
        relation.in_reply_to = Some(InReplyTo::new(event_id));
    }

    fn relation_type(&self) -> Option<&str> {
        self.relates_to()?.rel_type.as_deref()
    }
}

/// Capability: the content can be edited through `m.new_content`.
pub trait HasEditSupport: HasRelation + EventContent {
    fn new_content(&self) -> Option<&Self>;

    fn new_content_mut(&mut self) -> &mut Option<Box<Self>>;

    /// Turns this content into an edit of `target_event_id`.
    ///
    /// The current declared fields are copied into `m.new_content` and the
    /// relation is replaced with an `m.replace` pointer. Top-level fields are
    /// left as they are, so clients without edit support still show a body.
    fn set_replace_relation(&mut self, target_event_id: impl Into<String>) {
        let mut declared = self.declared_object();
        declared.remove(RELATES_TO);
        declared.remove(NEW_CONTENT);
        *self.new_content_mut() = Some(Box::new(Self::from_object(declared)));
        *self.relates_to_mut() = Some(RelatesTo::replace(target_event_id));
    }

    /// The event this content replaces, if it is an edit.
    fn replaced_event(&self) -> Option<&str> {
        let relation = self.relates_to()?;
        if relation.is_replace() {
            relation.event_id.as_deref()
        } else {
            None
        }
    }
}

/// Object-safe view of any [`EventContent`], used for heterogeneous storage.
pub trait AnyContent: fmt::Debug + Send + Sync {
    /// Model name of the concrete type.
    fn model_name(&self) -> &'static str;

    fn family(&self) -> ContentFamily;

    fn kind(&self) -> EventKind;

    /// Encodes the content, residue included.
    fn encode(&self) -> JsonObject;

    /// Keys the concrete type did not claim.
    fn unknown_fields(&self) -> &JsonObject;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn clone_box(&self) -> Box<dyn AnyContent>;
}

impl<T: EventContent> AnyContent for T {
    fn model_name(&self) -> &'static str {
        T::shape().name
    }

    fn family(&self) -> ContentFamily {
        T::FAMILY
    }

    fn kind(&self) -> EventKind {
        T::KIND
    }

    fn encode(&self) -> JsonObject {
        self.to_object()
    }

    fn unknown_fields(&self) -> &JsonObject {
        self.residue()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn AnyContent> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn AnyContent> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
