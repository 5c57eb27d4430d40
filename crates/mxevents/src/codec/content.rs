//! Content decoding and encoding through the registry.
//!
//! [`decode_content`] never fails. A wire type the registry does not know,
//! or a payload that is not an object, becomes [`Content::Unknown`], which
//! re-encodes to exactly the input tree.

use serde_json::Value;

use crate::codec::fields::DecodeOptions;
use crate::model::content::{AnyContent, EventContent, EventKind, RelatesTo};
use crate::model::JsonObject;
use crate::registry::{Registry, Variant};

/// Decoded event content.
#[derive(Debug, Clone)]
pub enum Content {
    /// Content of a registered variant.
    Known(KnownContent),
    /// Content kept verbatim because its type is not registered.
    Unknown(UnknownContent),
}

/// Content decoded into a registered variant.
#[derive(Debug, Clone)]
pub struct KnownContent {
    variant: Variant,
    wire_type: String,
    legacy: bool,
    inner: Box<dyn AnyContent>,
}

impl KnownContent {
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// The wire type this content was decoded from (or will be sent as).
    pub fn wire_type(&self) -> &str {
        &self.wire_type
    }

    /// True if decoded through a deprecated or unstable alias.
    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    pub fn inner(&self) -> &dyn AnyContent {
        self.inner.as_ref()
    }

    pub fn inner_mut(&mut self) -> &mut dyn AnyContent {
        self.inner.as_mut()
    }
}

/// Content of an unregistered type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownContent {
    pub wire_type: String,
    /// State or message, when known from the envelope.
    pub kind: Option<EventKind>,
    /// The whole content tree.
    pub raw: Value,
}

impl Content {
    /// Wraps typed content for sending, under its preferred wire type.
    pub fn new<T: EventContent>(content: T) -> Self {
        Content::Known(KnownContent {
            variant: Variant::of::<T>(),
            wire_type: T::wire_type().to_string(),
            legacy: false,
            inner: Box::new(content),
        })
    }

    pub fn wire_type(&self) -> &str {
        match self {
            Content::Known(known) => &known.wire_type,
            Content::Unknown(unknown) => &unknown.wire_type,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Content::Known(_))
    }

    pub fn variant(&self) -> Option<Variant> {
        match self {
            Content::Known(known) => Some(known.variant),
            Content::Unknown(_) => None,
        }
    }

    /// State or message. `None` for unknown content decoded without an
    /// envelope.
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Content::Known(known) => Some(known.variant.kind()),
            Content::Unknown(unknown) => unknown.kind,
        }
    }

    pub fn downcast_ref<T: EventContent>(&self) -> Option<&T> {
        match self {
            Content::Known(known) => known.inner.as_any().downcast_ref::<T>(),
            Content::Unknown(_) => None,
        }
    }

    pub fn downcast_mut<T: EventContent>(&mut self) -> Option<&mut T> {
        match self {
            Content::Known(known) => known.inner.as_any_mut().downcast_mut::<T>(),
            Content::Unknown(_) => None,
        }
    }

    /// The `m.relates_to` block, for variants that carry one.
    pub fn relation(&self) -> Option<&RelatesTo> {
        match self {
            Content::Known(known) => known.variant.relation(known.inner.as_ref()),
            Content::Unknown(_) => None,
        }
    }

    /// Keys the decoded variant did not claim. For unknown content this is
    /// the whole tree, if it is an object.
    pub fn unknown_fields(&self) -> Option<&JsonObject> {
        match self {
            Content::Known(known) => Some(known.inner.unknown_fields()),
            Content::Unknown(unknown) => unknown.raw.as_object(),
        }
    }

    /// Encodes back to a content tree.
    pub fn to_value(&self) -> Value {
        encode_content(self)
    }
}

impl<T: EventContent> From<T> for Content {
    fn from(content: T) -> Self {
        Content::new(content)
    }
}

/// Decodes a content tree of type `wire_type`.
pub fn decode_content(registry: &Registry, wire_type: &str, tree: Value) -> Content {
    decode_content_with_options(registry, wire_type, tree, DecodeOptions::default())
}

/// Decodes a content tree with explicit options.
pub fn decode_content_with_options(
    registry: &Registry,
    wire_type: &str,
    tree: Value,
    options: DecodeOptions,
) -> Content {
    let Some(entry) = registry.entry(wire_type) else {
        tracing::debug!(wire_type, "unregistered content type, keeping raw");
        return unknown(wire_type, tree);
    };

    let object = match tree {
        Value::Object(object) => object,
        other => {
            tracing::debug!(
                wire_type,
                model = entry.variant.name(),
                "content is not an object, keeping raw"
            );
            return unknown(wire_type, other);
        }
    };

    if entry.legacy {
        tracing::debug!(
            wire_type,
            model = entry.variant.name(),
            "decoding through legacy binding"
        );
    }

    Content::Known(KnownContent {
        variant: entry.variant,
        wire_type: wire_type.to_string(),
        legacy: entry.legacy,
        inner: entry.variant.decode(object, options),
    })
}

fn unknown(wire_type: &str, tree: Value) -> Content {
    Content::Unknown(UnknownContent {
        wire_type: wire_type.to_string(),
        kind: None,
        raw: tree,
    })
}

/// Encodes content back to its wire tree.
///
/// Residue is merged under the typed fields; unknown content is returned
/// as it was decoded.
pub fn encode_content(content: &Content) -> Value {
    match content {
        Content::Known(known) => Value::Object(known.inner.encode()),
        Content::Unknown(unknown) => unknown.raw.clone(),
    }
}
