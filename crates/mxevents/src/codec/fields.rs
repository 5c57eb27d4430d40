//! Field-level reading and writing over JSON objects.
//!
//! [`FieldReader`] moves declared keys out of a content object into typed
//! values. Whatever it cannot place, because the key is undeclared, the value
//! has the wrong type, or nesting is too deep, stays behind as residue.
//! [`FieldWriter`] does the reverse, starting from residue and writing typed
//! values over it.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::limits::MAX_NESTING_DEPTH;
use crate::model::record::Record;
use crate::model::JsonObject;

/// Options for content decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Nested records deeper than this are kept raw in residue.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { max_depth: MAX_NESTING_DEPTH }
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Reader over a single JSON object.
///
/// Each `take*` call claims one wire key. Claimed keys whose value cannot be
/// represented exactly by the requested type are put back, so calling
/// [`take_residue`](Self::take_residue) last yields everything unclaimed.
#[derive(Debug)]
pub struct FieldReader {
    object: JsonObject,
    depth: usize,
    options: DecodeOptions,
    model: &'static str,
}

impl FieldReader {
    /// Creates a reader at the root of a content tree.
    pub fn new(object: JsonObject, model: &'static str) -> Self {
        Self::with_options(object, model, DecodeOptions::default())
    }

    pub fn with_options(object: JsonObject, model: &'static str, options: DecodeOptions) -> Self {
        Self { object, depth: 0, options, model }
    }

    fn nested(&self, object: JsonObject, model: &'static str) -> Self {
        Self {
            object,
            depth: self.depth + 1,
            options: self.options,
            model,
        }
    }

    /// Claims a scalar or container value.
    ///
    /// The value is accepted only if serializing the decoded value gives back
    /// exactly the raw JSON; otherwise it stays in residue. `null` is never
    /// claimed.
    pub fn take<T>(&mut self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Serialize,
    {
        let raw = self.object.remove(key)?;
        if raw.is_null() {
            self.object.insert(key.to_string(), raw);
            return None;
        }

        match serde_json::from_value::<T>(raw.clone()) {
            Ok(value) if serde_json::to_value(&value).ok().as_ref() == Some(&raw) => Some(value),
            _ => {
                tracing::debug!(
                    model = self.model,
                    field = key,
                    "field value does not fit declared type, keeping as residue"
                );
                self.object.insert(key.to_string(), raw);
                None
            }
        }
    }

    /// Claims a nested record.
    pub fn take_record<T: Record>(&mut self, key: &str) -> Option<T> {
        if !self.can_descend(key) {
            return None;
        }
        match self.object.remove(key)? {
            Value::Object(inner) => {
                let mut reader = self.nested(inner, T::shape().name);
                Some(T::read_fields(&mut reader))
            }
            other => {
                tracing::debug!(
                    model = self.model,
                    field = key,
                    "expected an object, keeping as residue"
                );
                self.object.insert(key.to_string(), other);
                None
            }
        }
    }

    /// Claims an array of records. All elements must be objects.
    pub fn take_records<T: Record>(&mut self, key: &str) -> Option<Vec<T>> {
        if !self.can_descend(key) {
            return None;
        }
        let all_objects = match self.object.get(key)? {
            Value::Array(items) => items.iter().all(Value::is_object),
            _ => false,
        };
        if !all_objects {
            tracing::debug!(
                model = self.model,
                field = key,
                "expected an array of objects, keeping as residue"
            );
            return None;
        }

        let Some(Value::Array(items)) = self.object.remove(key) else {
            return None;
        };
        let records = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(inner) => {
                    let mut reader = self.nested(inner, T::shape().name);
                    Some(T::read_fields(&mut reader))
                }
                _ => None,
            })
            .collect();
        Some(records)
    }

    /// Removes and returns every unclaimed key. Call this last.
    pub fn take_residue(&mut self) -> JsonObject {
        std::mem::take(&mut self.object)
    }

    fn can_descend(&self, key: &str) -> bool {
        if self.depth + 1 > self.options.max_depth {
            if self.object.contains_key(key) {
                tracing::debug!(
                    model = self.model,
                    field = key,
                    max_depth = self.options.max_depth,
                    "nesting too deep, keeping as residue"
                );
            }
            return false;
        }
        true
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer that merges typed values over residue.
#[derive(Debug, Default)]
pub struct FieldWriter {
    object: JsonObject,
}

impl FieldWriter {
    /// Creates a writer seeded with residue.
    pub fn new(residue: JsonObject) -> Self {
        Self { object: residue }
    }

    /// Writes `value` under `key` if it is set, replacing any residue entry.
    pub fn put<T: Serialize>(&mut self, key: &str, value: &Option<T>) {
        let Some(value) = value else {
            return;
        };
        match serde_json::to_value(value) {
            Ok(json) => {
                self.object.insert(key.to_string(), json);
            }
            Err(err) => {
                tracing::warn!(field = key, error = %err, "failed to serialize field, skipping");
            }
        }
    }

    /// Writes a nested record if it is set.
    pub fn put_record<T: Record>(&mut self, key: &str, value: Option<&T>) {
        if let Some(record) = value {
            self.object.insert(key.to_string(), Value::Object(record.to_object()));
        }
    }

    /// Writes an array of records if it is set.
    pub fn put_records<T: Record>(&mut self, key: &str, value: Option<&[T]>) {
        if let Some(records) = value {
            let items = records.iter().map(|r| Value::Object(r.to_object())).collect();
            self.object.insert(key.to_string(), Value::Array(items));
        }
    }

    /// Returns the merged object.
    pub fn finish(self) -> JsonObject {
        self.object
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_take_claims_matching_value() {
        let mut reader = FieldReader::new(object(json!({"body": "hi", "n": 3})), "Test");
        assert_eq!(reader.take::<String>("body"), Some("hi".to_string()));
        assert_eq!(reader.take::<i64>("n"), Some(3));
        assert!(reader.take_residue().is_empty());
    }

    #[test]
    fn test_take_mismatch_stays_in_residue() {
        let mut reader = FieldReader::new(object(json!({"n": "three"})), "Test");
        assert_eq!(reader.take::<i64>("n"), None);
        assert_eq!(reader.take_residue(), object(json!({"n": "three"})));
    }

    #[test]
    fn test_take_float_into_integer_is_rejected() {
        let mut reader = FieldReader::new(object(json!({"n": 1.5})), "Test");
        assert_eq!(reader.take::<i64>("n"), None);
        assert_eq!(reader.take_residue().get("n"), Some(&json!(1.5)));
    }

    #[test]
    fn test_take_null_is_not_claimed() {
        let mut reader = FieldReader::new(object(json!({"body": null})), "Test");
        assert_eq!(reader.take::<String>("body"), None);
        assert_eq!(reader.take_residue().get("body"), Some(&Value::Null));
    }

    #[test]
    fn test_take_absent_key() {
        let mut reader = FieldReader::new(JsonObject::new(), "Test");
        assert_eq!(reader.take::<String>("body"), None);
        assert!(reader.take_residue().is_empty());
    }

    #[test]
    fn test_partial_list_mismatch_keeps_whole_list() {
        let mut reader = FieldReader::new(object(json!({"tags": ["a", 1]})), "Test");
        assert_eq!(reader.take::<Vec<String>>("tags"), None);
        assert_eq!(reader.take_residue().get("tags"), Some(&json!(["a", 1])));
    }

    #[test]
    fn test_writer_overwrites_residue() {
        let mut writer = FieldWriter::new(object(json!({"body": 5, "other": true})));
        writer.put("body", &Some("typed".to_string()));
        writer.put::<String>("absent", &None);
        assert_eq!(
            writer.finish(),
            object(json!({"body": "typed", "other": true}))
        );
    }
}
