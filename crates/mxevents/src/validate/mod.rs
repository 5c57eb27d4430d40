//! Schema-drift validation for Matrix payloads.
//!
//! Decoding never rejects unknown keys; it keeps them as residue. This
//! module is the explicit check: given a payload and the model chosen to
//! represent it, report every key path the model does not declare.
//!
//! Only unknown keys are reported. A declared key holding a value of the
//! wrong type is not drift.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::{RegistryError, ValidationError};
use crate::limits::MAX_NESTING_DEPTH;
use crate::model::content::fallback_content_shape;
use crate::model::envelope::EVENT_SHAPE;
use crate::model::shape::{FieldKind, FieldShape, Shape};
use crate::model::JsonObject;
use crate::registry::{self, Registry};

/// Options for drift validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Payloads nested deeper than this fail with [`ValidationError::TooDeep`].
    pub max_depth: usize,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self { max_depth: MAX_NESTING_DEPTH }
    }
}

/// Paths of undeclared keys, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport {
    pub extra: Vec<String>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.extra.is_empty()
    }

    pub fn has_extra(&self) -> bool {
        !self.extra.is_empty()
    }
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extra.is_empty() {
            return f.write_str("no extra fields");
        }
        write!(f, "{} extra field(s): {}", self.extra.len(), self.extra.join(", "))
    }
}

/// Reports every key in `tree` that `shape` does not declare.
///
/// Nested records, lists and maps are walked against their declared element
/// shapes. Content fields are walked against the variant the registry
/// resolves from their discriminator, or the fallback content shape.
pub fn find_extra_fields(
    tree: &Value,
    shape: &'static Shape,
    registry: &Registry,
    options: ValidateOptions,
) -> Result<DriftReport, ValidationError> {
    let mut walker = Walker {
        registry,
        options,
        extra: Vec::new(),
    };
    walker.record(tree, shape, "$", 0, None)?;
    Ok(DriftReport { extra: walker.extra })
}

struct Walker<'r> {
    registry: &'r Registry,
    options: ValidateOptions,
    extra: Vec<String>,
}

impl Walker<'_> {
    fn check_depth(&self, path: &str, depth: usize) -> Result<(), ValidationError> {
        if depth > self.options.max_depth {
            return Err(ValidationError::TooDeep {
                path: path.to_string(),
                max: self.options.max_depth,
            });
        }
        Ok(())
    }

    fn record(
        &mut self,
        value: &Value,
        shape: &'static Shape,
        path: &str,
        depth: usize,
        context: Option<&str>,
    ) -> Result<(), ValidationError> {
        let Value::Object(object) = value else {
            return Ok(());
        };
        self.check_depth(path, depth)?;

        let fields = shape.declared_fields();
        let context = own_discriminator(object, &fields).or(context);

        for (key, child) in object {
            let child_path = format!("{path}.{key}");
            match fields.iter().find(|f| f.wire_name == key.as_str()) {
                Some(field) => {
                    self.kind(child, &field.kind, shape, object, &child_path, depth + 1, context)?
                }
                None => self.extra.push(child_path),
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn kind(
        &mut self,
        value: &Value,
        kind: &FieldKind,
        owner: &'static Shape,
        siblings: &JsonObject,
        path: &str,
        depth: usize,
        context: Option<&str>,
    ) -> Result<(), ValidationError> {
        match kind {
            FieldKind::Scalar | FieldKind::Opaque => Ok(()),
            FieldKind::Record(shape) => self.record(value, shape(), path, depth, context),
            FieldKind::Inherit => self.record(value, owner, path, depth, context),
            FieldKind::Content {
                discriminator,
                fallback,
            } => {
                let wire_type = siblings.get(*discriminator).and_then(Value::as_str).or(context);
                let shape = wire_type
                    .and_then(|t| self.registry.resolve(t))
                    .map(|v| v.shape())
                    .unwrap_or_else(|| fallback());
                self.record(value, shape, path, depth, wire_type)
            }
            FieldKind::List(inner) => {
                let Value::Array(items) = value else {
                    return Ok(());
                };
                self.check_depth(path, depth)?;
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    self.kind(item, inner, owner, siblings, &item_path, depth + 1, context)?;
                }
                Ok(())
            }
            FieldKind::Map(inner) => {
                let Value::Object(entries) = value else {
                    return Ok(());
                };
                self.check_depth(path, depth)?;
                for (key, item) in entries {
                    let item_path = format!("{path}.{key}");
                    self.kind(item, inner, owner, siblings, &item_path, depth + 1, context)?;
                }
                Ok(())
            }
        }
    }
}

/// The discriminator value for content fields declared on this record, if
/// the record carries one (e.g. an event's `type`).
fn own_discriminator<'v>(
    object: &'v JsonObject,
    fields: &[&'static FieldShape],
) -> Option<&'v str> {
    fields.iter().find_map(|f| match f.kind {
        FieldKind::Content { discriminator, .. } => object.get(discriminator)?.as_str(),
        _ => None,
    })
}

// =============================================================================
// MODEL CATALOGUE
// =============================================================================

/// Catalogue of every model the validator can check against.
///
/// Built from a registry: each content variant, every record reachable from
/// it, the fallback content shape and the event envelope are indexed by
/// model name. Content models can also be looked up by wire type.
#[derive(Debug, Clone)]
pub struct SchemaContext {
    registry: Arc<Registry>,
    models: FxHashMap<&'static str, &'static Shape>,
}

impl SchemaContext {
    /// Creates a catalogue over `registry`.
    pub fn new(registry: Arc<Registry>) -> Self {
        let mut context = Self {
            registry,
            models: FxHashMap::default(),
        };
        context.add_shape(&EVENT_SHAPE);
        context.add_shape(fallback_content_shape());
        let shapes: Vec<&'static Shape> =
            context.registry.variants().iter().map(|v| v.shape()).collect();
        for shape in shapes {
            context.add_shape(shape);
        }
        context
    }

    /// Creates a catalogue over the process-wide registry.
    pub fn global() -> Result<Self, RegistryError> {
        Ok(Self::new(registry::global()?))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Registers a shape and every record shape reachable from it.
    pub fn add_shape(&mut self, shape: &'static Shape) {
        if self.models.insert(shape.name, shape).is_some() {
            return;
        }
        if let Some(parent) = shape.parent {
            self.add_shape(parent);
        }
        for field in shape.fields {
            self.add_kind(&field.kind);
        }
    }

    fn add_kind(&mut self, kind: &FieldKind) {
        match kind {
            FieldKind::Record(shape) => self.add_shape(shape()),
            FieldKind::List(inner) | FieldKind::Map(inner) => self.add_kind(inner),
            FieldKind::Content { fallback, .. } => self.add_shape(fallback()),
            FieldKind::Scalar | FieldKind::Opaque | FieldKind::Inherit => {}
        }
    }

    /// Looks up a model by name, or a content model by wire type.
    pub fn shape(&self, name: &str) -> Option<&'static Shape> {
        self.models
            .get(name)
            .copied()
            .or_else(|| self.registry.resolve(name).map(|v| v.shape()))
    }

    /// Every catalogued model name, sorted.
    pub fn model_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.models.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Checks `payload` against the model named `model`.
    ///
    /// An unknown model name is an error; extra fields are a normal result.
    pub fn check(&self, model: &str, payload: &Value) -> Result<DriftReport, ValidationError> {
        self.check_with_options(model, payload, ValidateOptions::default())
    }

    pub fn check_with_options(
        &self,
        model: &str,
        payload: &Value,
        options: ValidateOptions,
    ) -> Result<DriftReport, ValidationError> {
        let shape = self.shape(model).ok_or_else(|| ValidationError::ModelNotFound {
            name: model.to_string(),
        })?;
        find_extra_fields(payload, shape, &self.registry, options)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorCode;

    static BODY_MSGTYPE: Shape = Shape {
        name: "BodyAndMsgtype",
        parent: None,
        fields: &[FieldShape::scalar("body"), FieldShape::scalar("msgtype")],
    };

    fn context() -> SchemaContext {
        SchemaContext::new(Arc::new(Registry::builtin().unwrap()))
    }

    #[test]
    fn test_single_extra_field() {
        let registry = Registry::builtin().unwrap();
        let payload = json!({"body": "hi", "msgtype": "m.text", "unexpected_field": 1});
        let report =
            find_extra_fields(&payload, &BODY_MSGTYPE, &registry, ValidateOptions::default())
                .unwrap();
        assert_eq!(report.extra, ["$.unexpected_field"]);
        assert!(report.has_extra());

        let clean = json!({"body": "hi", "msgtype": "m.text"});
        let report =
            find_extra_fields(&clean, &BODY_MSGTYPE, &registry, ValidateOptions::default())
                .unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_check_by_model_name_and_wire_type() {
        let context = context();
        let payload = json!({"body": "hi", "msgtype": "m.text", "unexpected_field": 1});
        let by_name = context.check("RoomMessageEventContent", &payload).unwrap();
        let by_type = context.check("m.room.message", &payload).unwrap();
        assert_eq!(by_name.extra, ["$.unexpected_field"]);
        assert_eq!(by_name, by_type);
    }

    #[test]
    fn test_unknown_model_is_not_found() {
        let err = context().check("NoSuchModel", &json!({})).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_nested_records_and_new_content() {
        let payload = json!({
            "msgtype": "m.text",
            "body": "* fixed",
            "m.new_content": {"msgtype": "m.text", "body": "fixed", "x.edit": true},
            "m.relates_to": {
                "rel_type": "m.replace",
                "event_id": "$abc",
                "m.in_reply_to": {"event_id": "$p", "x.reply": 1}
            }
        });
        let report = context().check("RoomMessageEventContent", &payload).unwrap();
        assert_eq!(
            report.extra,
            ["$.m.new_content.x.edit", "$.m.relates_to.m.in_reply_to.x.reply"]
        );
    }

    #[test]
    fn test_lists_and_maps() {
        let poll = json!({
            "m.poll": {
                "question": {"m.text": [{"body": "Lunch?", "x.q": 1}]},
                "answers": [{"m.id": "a", "m.text": [{"body": "Pizza"}], "x.a": 2}]
            }
        });
        let report = context().check("PollStartEventContent", &poll).unwrap();
        assert_eq!(
            report.extra,
            ["$.m.poll.answers[0].x.a", "$.m.poll.question.m.text[0].x.q"]
        );

        // Map keys are data, not fields.
        let levels = json!({"users": {"@a:example.org": 100}, "users_default": 0});
        assert!(context().check("m.room.power_levels", &levels).unwrap().is_clean());
    }

    #[test]
    fn test_event_content_uses_sibling_discriminator() {
        let event = json!({
            "type": "m.room.topic",
            "state_key": "",
            "content": {"topic": "t", "x.topic": 1},
            "unsigned": {"prev_content": {"topic": "old", "x.prev": 2}},
            "x.env": true
        });
        let report = context().check("Event", &event).unwrap();
        assert_eq!(
            report.extra,
            ["$.content.x.topic", "$.unsigned.prev_content.x.prev", "$.x.env"]
        );
    }

    #[test]
    fn test_bare_content_declares_relation() {
        let relation = json!({"rel_type": "m.reference", "event_id": "$x"});
        let member = json!({"membership": "join", "m.relates_to": relation});
        let redaction = json!({"redacts": "$x", "m.relates_to": relation});
        let context = context();
        assert!(context.check("m.room.member", &member).unwrap().is_clean());
        assert!(context.check("m.room.redaction", &redaction).unwrap().is_clean());

        let stray = json!({"redacts": "$x", "m.relates_to": {"event_id": "$x", "x.r": 1}});
        let report = context.check("RoomRedactionEventContent", &stray).unwrap();
        assert_eq!(report.extra, ["$.m.relates_to.x.r"]);
    }

    #[test]
    fn test_unknown_type_uses_fallback_shape() {
        let event = json!({
            "type": "org.example.custom",
            "content": {"m.relates_to": {"event_id": "$x"}, "custom": 1}
        });
        let report = context().check("Event", &event).unwrap();
        assert_eq!(report.extra, ["$.content.custom"]);
    }

    #[test]
    fn test_too_deep() {
        let mut payload = json!({"body": "leaf"});
        for _ in 0..5 {
            payload = json!({"m.new_content": payload});
        }
        let options = ValidateOptions { max_depth: 3 };
        let err = context()
            .check_with_options("RoomMessageEventContent", &payload, options)
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooDeep { max: 3, .. }));
        assert_eq!(err.code(), ErrorCode::TooLarge);
    }

    #[test]
    fn test_catalogue_contains_nested_models() {
        let names = context().model_names();
        for name in ["Event", "Envelope", "Unsigned", "RelatesTo", "InReplyTo", "PollAnswer"] {
            assert!(names.contains(&name), "missing {name}");
        }
    }
}
