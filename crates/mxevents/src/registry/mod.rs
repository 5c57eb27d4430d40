//! The event-content type registry.
//!
//! A [`Registry`] maps wire type names to content variants. It is built once
//! from an explicit list of variants by [`RegistryBuilder`], checked for
//! conflicts, and never mutated afterwards. A process-wide instance is
//! available through [`global`]; tests may [`install`] a different one,
//! which replaces the previous instance as a whole.

mod builtin;

use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

use crate::codec::fields::DecodeOptions;
use crate::error::RegistryError;
use crate::limits::is_envelope_reserved;
use crate::model::content::{
    preferred_wire_name, AnyContent, Binding, ContentFamily, EventContent, EventKind, RelatesTo,
};
use crate::model::record::Record;
use crate::model::shape::{Shape, ShapeFn};
use crate::model::JsonObject;

pub use builtin::builtin_variants;

// =============================================================================
// VARIANTS
// =============================================================================

/// A registered content type, erased to function pointers.
#[derive(Clone, Copy)]
pub struct Variant {
    type_id: fn() -> TypeId,
    shape: ShapeFn,
    family: ContentFamily,
    kind: EventKind,
    bindings: &'static [Binding],
    decode: fn(JsonObject, DecodeOptions) -> Box<dyn AnyContent>,
    relation: for<'a> fn(&'a dyn AnyContent) -> Option<&'a RelatesTo>,
}

fn decode_as<T: EventContent>(object: JsonObject, options: DecodeOptions) -> Box<dyn AnyContent> {
    Box::new(T::from_object_with_options(object, options))
}

fn relation_of<T: EventContent>(content: &dyn AnyContent) -> Option<&RelatesTo> {
    content.as_any().downcast_ref::<T>()?.relation()
}

impl Variant {
    /// Describes the content type `T`.
    pub fn of<T: EventContent>() -> Self {
        Self {
            type_id: TypeId::of::<T>,
            shape: T::shape,
            family: T::FAMILY,
            kind: T::KIND,
            bindings: T::BINDINGS,
            decode: decode_as::<T>,
            relation: relation_of::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Model name of the content type.
    pub fn name(&self) -> &'static str {
        self.shape().name
    }

    pub fn shape(&self) -> &'static Shape {
        (self.shape)()
    }

    pub fn family(&self) -> ContentFamily {
        self.family
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn bindings(&self) -> &'static [Binding] {
        self.bindings
    }

    /// True if this variant describes `T`.
    pub fn is<T: EventContent>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// Decodes a content object into this variant. Never fails.
    pub fn decode(&self, object: JsonObject, options: DecodeOptions) -> Box<dyn AnyContent> {
        (self.decode)(object, options)
    }

    /// Relation block of `content`, if `content` is this variant and has one.
    pub fn relation<'a>(&self, content: &'a dyn AnyContent) -> Option<&'a RelatesTo> {
        (self.relation)(content)
    }

    /// Preferred wire name: first non-legacy binding, else the first binding.
    pub fn wire_name(&self) -> Option<&'static str> {
        preferred_wire_name(self.bindings)
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for Variant {}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("name", &self.name())
            .field("family", &self.family)
            .field("kind", &self.kind)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// What a wire name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub variant: Variant,
    /// The name is a deprecated or unstable alias.
    pub legacy: bool,
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Immutable mapping from wire type names to content variants.
#[derive(Debug, Clone)]
pub struct Registry {
    by_wire_name: FxHashMap<&'static str, Entry>,
    variants: Vec<Variant>,
}

impl Registry {
    /// Builds a registry of every content type this crate defines.
    pub fn builtin() -> Result<Self, RegistryError> {
        builtin_variants()
            .into_iter()
            .fold(RegistryBuilder::new(), RegistryBuilder::register_variant)
            .build()
    }

    /// Starts an empty builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Looks up a wire type name. Exact, case-sensitive match.
    pub fn resolve(&self, wire_name: &str) -> Option<Variant> {
        self.entry(wire_name).map(|e| e.variant)
    }

    /// Looks up a wire type name along with its legacy flag.
    pub fn entry(&self, wire_name: &str) -> Option<Entry> {
        self.by_wire_name.get(wire_name).copied()
    }

    /// Looks up a variant by model name.
    pub fn variant_named(&self, name: &str) -> Option<Variant> {
        self.variants.iter().find(|v| v.name() == name).copied()
    }

    /// Looks up the variant describing `T`.
    pub fn variant_of<T: EventContent>(&self) -> Option<Variant> {
        self.variants.iter().find(|v| v.is::<T>()).copied()
    }

    /// Wire name used when sending content of `variant`.
    ///
    /// Returns `None` if the variant is not registered here.
    pub fn wire_name_for(&self, variant: &Variant) -> Option<&'static str> {
        if !self.variants.contains(variant) {
            return None;
        }
        variant.wire_name()
    }

    /// Every registered wire name, in no particular order.
    pub fn wire_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_wire_name.keys().copied()
    }

    /// Registered variants, in registration order.
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Number of registered wire names.
    pub fn len(&self) -> usize {
        self.by_wire_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_wire_name.is_empty()
    }
}

/// Collects variants and checks them when building a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    variants: Vec<Variant>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under all of its bindings.
    pub fn register<T: EventContent>(self) -> Self {
        self.register_variant(Variant::of::<T>())
    }

    /// Registers a variant. Registering the same variant twice is a no-op.
    pub fn register_variant(mut self, variant: Variant) -> Self {
        if !self.variants.contains(&variant) {
            self.variants.push(variant);
        }
        self
    }

    /// Checks every variant and builds the registry.
    ///
    /// Fails if two different variants claim the same wire name, if a
    /// variant declares an envelope-reserved or duplicated field, or if a
    /// variant has no usable bindings.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut by_wire_name: FxHashMap<&'static str, Entry> = FxHashMap::default();

        for variant in &self.variants {
            check_variant(variant)?;

            for binding in variant.bindings() {
                let entry = Entry {
                    variant: *variant,
                    legacy: binding.legacy,
                };
                match by_wire_name.get(binding.wire_name) {
                    Some(existing) if existing.variant != *variant => {
                        return Err(RegistryError::DuplicateWireName {
                            wire_name: binding.wire_name.to_string(),
                            existing: existing.variant.name(),
                            conflicting: variant.name(),
                        });
                    }
                    // Same variant listing a name twice: current binding wins.
                    Some(existing) if !existing.legacy => {}
                    _ => {
                        by_wire_name.insert(binding.wire_name, entry);
                    }
                }
            }
        }

        tracing::info!(
            variants = self.variants.len(),
            wire_names = by_wire_name.len(),
            "built event content registry"
        );

        Ok(Registry {
            by_wire_name,
            variants: self.variants,
        })
    }
}

fn check_variant(variant: &Variant) -> Result<(), RegistryError> {
    let type_name = variant.name();
    if variant.bindings().is_empty() {
        return Err(RegistryError::NoBindings { type_name });
    }
    if variant.bindings().iter().any(|b| b.wire_name.is_empty()) {
        return Err(RegistryError::EmptyWireName { type_name });
    }

    let shape = variant.shape();
    if let Some(field) = shape
        .declared_fields()
        .into_iter()
        .map(|f| f.wire_name)
        .find(|name| is_envelope_reserved(name))
    {
        return Err(RegistryError::ReservedFieldName { type_name, field });
    }
    if let Some(field) = shape.duplicate_field() {
        return Err(RegistryError::DuplicateFieldName { type_name, field });
    }
    Ok(())
}

// =============================================================================
// PROCESS-WIDE INSTANCE
// =============================================================================

lazy_static! {
    static ref GLOBAL: RwLock<Option<Arc<Registry>>> = RwLock::new(None);
}

/// Returns the process-wide registry, building the builtin one on first use.
///
/// A build failure is returned on every call; no partial registry is ever
/// installed.
pub fn global() -> Result<Arc<Registry>, RegistryError> {
    if let Some(registry) = GLOBAL.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
        return Ok(Arc::clone(registry));
    }

    let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(registry) = slot.as_ref() {
        return Ok(Arc::clone(registry));
    }
    let registry = Arc::new(Registry::builtin()?);
    *slot = Some(Arc::clone(&registry));
    Ok(registry)
}

/// Replaces the process-wide registry. Callers holding the previous instance
/// keep using it.
pub fn install(registry: Registry) -> Arc<Registry> {
    let registry = Arc::new(registry);
    *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&registry));
    registry
}

/// Drops the process-wide registry; the next [`global`] call rebuilds it.
pub fn reset() {
    *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::fields::{FieldReader, FieldWriter};
    use crate::model::content::message::RoomMessageEventContent;
    use crate::model::content::poll::PollStartEventContent;
    use crate::model::content::reaction::ReactionEventContent;
    use crate::model::shape::FieldShape;

    static SHADOW_SHAPE: Shape = Shape {
        name: "ShadowMessageContent",
        parent: None,
        fields: &[FieldShape::scalar("body")],
    };

    /// Claims `m.room.message`, which is already taken by the builtin type.
    #[derive(Debug, Clone, Default)]
    struct ShadowMessageContent {
        body: Option<String>,
        extra: JsonObject,
    }

    impl Record for ShadowMessageContent {
        fn shape() -> &'static Shape {
            &SHADOW_SHAPE
        }

        fn read_fields(fields: &mut FieldReader) -> Self {
            Self {
                body: fields.take("body"),
                extra: fields.take_residue(),
            }
        }

        fn write_fields(&self, out: &mut FieldWriter) {
            out.put("body", &self.body);
        }

        fn residue(&self) -> &JsonObject {
            &self.extra
        }
    }

    impl EventContent for ShadowMessageContent {
        const BINDINGS: &'static [Binding] = &[Binding::current("m.room.message")];
        const FAMILY: ContentFamily = ContentFamily::Bare;
        const KIND: EventKind = EventKind::Message;
    }

    static RESERVED_SHAPE: Shape = Shape {
        name: "ReservedFieldContent",
        parent: None,
        fields: &[FieldShape::scalar("sender")],
    };

    #[derive(Debug, Clone, Default)]
    struct ReservedFieldContent {
        extra: JsonObject,
    }

    impl Record for ReservedFieldContent {
        fn shape() -> &'static Shape {
            &RESERVED_SHAPE
        }

        fn read_fields(fields: &mut FieldReader) -> Self {
            Self { extra: fields.take_residue() }
        }

        fn write_fields(&self, _out: &mut FieldWriter) {}

        fn residue(&self) -> &JsonObject {
            &self.extra
        }
    }

    impl EventContent for ReservedFieldContent {
        const BINDINGS: &'static [Binding] = &[Binding::current("org.example.reserved")];
        const FAMILY: ContentFamily = ContentFamily::Bare;
        const KIND: EventKind = EventKind::Message;
    }

    static TWICE_SHAPE: Shape = Shape {
        name: "NamedTwiceContent",
        parent: None,
        fields: &[],
    };

    /// Lists each of its names once as legacy and once as current.
    #[derive(Debug, Clone, Default)]
    struct NamedTwiceContent {
        extra: JsonObject,
    }

    impl Record for NamedTwiceContent {
        fn shape() -> &'static Shape {
            &TWICE_SHAPE
        }

        fn read_fields(fields: &mut FieldReader) -> Self {
            Self { extra: fields.take_residue() }
        }

        fn write_fields(&self, _out: &mut FieldWriter) {}

        fn residue(&self) -> &JsonObject {
            &self.extra
        }
    }

    impl EventContent for NamedTwiceContent {
        const BINDINGS: &'static [Binding] = &[
            Binding::legacy("org.example.a"),
            Binding::current("org.example.a"),
            Binding::current("org.example.b"),
            Binding::legacy("org.example.b"),
        ];
        const FAMILY: ContentFamily = ContentFamily::Bare;
        const KIND: EventKind = EventKind::Message;
    }

    #[test]
    fn test_current_binding_wins_for_repeated_name() {
        let registry = Registry::builder().register::<NamedTwiceContent>().build().unwrap();
        assert_eq!(registry.len(), 2);
        assert!(!registry.entry("org.example.a").unwrap().legacy);
        assert!(!registry.entry("org.example.b").unwrap().legacy);
        assert_eq!(Variant::of::<NamedTwiceContent>().wire_name(), Some("org.example.a"));
    }

    #[test]
    fn test_builtin_registry_resolves_aliases() {
        let registry = Registry::builtin().unwrap();
        let stable = registry.entry("m.poll.start").unwrap();
        let unstable = registry.entry("org.matrix.msc3381.poll.start").unwrap();
        assert_eq!(stable.variant, unstable.variant);
        assert!(!stable.legacy);
        assert!(unstable.legacy);
        assert!(stable.variant.is::<PollStartEventContent>());
    }

    #[test]
    fn test_resolve_is_exact() {
        let registry = Registry::builtin().unwrap();
        assert!(registry.resolve("m.room.message").is_some());
        assert!(registry.resolve("M.ROOM.MESSAGE").is_none());
        assert!(registry.resolve("m.room.message ").is_none());
        assert!(registry.resolve("m.room").is_none());
    }

    #[test]
    fn test_duplicate_wire_name_is_rejected() {
        let err = Registry::builder()
            .register::<RoomMessageEventContent>()
            .register::<ShadowMessageContent>()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateWireName {
                wire_name: "m.room.message".to_string(),
                existing: "RoomMessageEventContent",
                conflicting: "ShadowMessageContent",
            }
        );
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let registry = Registry::builder()
            .register::<ReactionEventContent>()
            .register::<ReactionEventContent>()
            .build()
            .unwrap();
        assert_eq!(registry.variants().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reserved_field_is_rejected() {
        let err = Registry::builder()
            .register::<ReservedFieldContent>()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::ReservedFieldName {
                type_name: "ReservedFieldContent",
                field: "sender",
            }
        );
    }

    #[test]
    fn test_wire_name_for_prefers_current() {
        let registry = Registry::builtin().unwrap();
        let poll = registry.variant_of::<PollStartEventContent>().unwrap();
        assert_eq!(registry.wire_name_for(&poll), Some("m.poll.start"));

        let empty = Registry::builder().build().unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.wire_name_for(&poll), None);
    }

    #[test]
    fn test_variant_named() {
        let registry = Registry::builtin().unwrap();
        let variant = registry.variant_named("RoomMessageEventContent").unwrap();
        assert!(variant.is::<RoomMessageEventContent>());
        assert!(registry.variant_named("NoSuchContent").is_none());
    }

    #[test]
    fn test_install_replaces_whole_instance() {
        let before = global().unwrap();
        let custom = install(
            Registry::builder()
                .register::<ReactionEventContent>()
                .build()
                .unwrap(),
        );
        // Existing snapshots are untouched.
        assert!(before.resolve("m.room.message").is_some());
        assert!(custom.resolve("m.room.message").is_none());
        reset();
        assert!(global().unwrap().resolve("m.room.message").is_some());
    }
}
