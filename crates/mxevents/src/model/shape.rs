//! Declared shapes: the static description of which wire keys a model owns.
//!
//! Every record type in this crate (content variants, nested blocks, the
//! envelope) publishes a [`Shape`]. The codec uses it to decide what becomes
//! residue and the drift validator uses it to find fields nobody declared.

use std::fmt;

/// Returns the shape of a model. Stored as a function pointer so shapes can
/// reference each other without static initialisation cycles.
pub type ShapeFn = fn() -> &'static Shape;

/// How a declared field's value is structured.
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// String, number or boolean. Not descended into.
    Scalar,
    /// Arbitrary JSON the model keeps verbatim. Not descended into.
    Opaque,
    /// A nested object with its own shape.
    Record(ShapeFn),
    /// A homogeneous array.
    List(&'static FieldKind),
    /// A homogeneous string-keyed map.
    Map(&'static FieldKind),
    /// Event content whose shape depends on an event type string.
    ///
    /// The type is read from `discriminator` on the enclosing object, or
    /// inherited from the nearest ancestor that carried one. When it cannot
    /// be resolved, `fallback` is used.
    Content {
        discriminator: &'static str,
        fallback: ShapeFn,
    },
    /// Same shape as the record that declares the field (`m.new_content`).
    Inherit,
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar => f.write_str("Scalar"),
            FieldKind::Opaque => f.write_str("Opaque"),
            FieldKind::Record(shape) => write!(f, "Record({})", shape().name),
            FieldKind::List(inner) => write!(f, "List({inner:?})"),
            FieldKind::Map(inner) => write!(f, "Map({inner:?})"),
            FieldKind::Content { discriminator, .. } => write!(f, "Content({discriminator})"),
            FieldKind::Inherit => f.write_str("Inherit"),
        }
    }
}

/// One declared field: its wire name and value kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldShape {
    pub wire_name: &'static str,
    pub kind: FieldKind,
}

impl FieldShape {
    pub const fn new(wire_name: &'static str, kind: FieldKind) -> Self {
        Self { wire_name, kind }
    }

    pub const fn scalar(wire_name: &'static str) -> Self {
        Self::new(wire_name, FieldKind::Scalar)
    }
}

/// The declared shape of a record.
///
/// `parent` carries family-level fields (relation, edit support) shared by
/// many variants; they count as declared for every shape that inherits them.
#[derive(Debug)]
pub struct Shape {
    /// Model name, used by the validator entry point.
    pub name: &'static str,
    pub parent: Option<&'static Shape>,
    pub fields: &'static [FieldShape],
}

impl Shape {
    /// Returns declared fields, family-level fields first.
    pub fn declared_fields(&self) -> Vec<&'static FieldShape> {
        let mut fields = self.parent.map(Shape::declared_fields).unwrap_or_default();
        fields.extend(self.fields.iter());
        fields
    }

    /// Looks up a declared field by wire name.
    pub fn field(&self, wire_name: &str) -> Option<&'static FieldShape> {
        self.declared_fields().into_iter().find(|f| f.wire_name == wire_name)
    }

    /// Returns true if `wire_name` is declared by this shape or its family.
    pub fn declares(&self, wire_name: &str) -> bool {
        self.field(wire_name).is_some()
    }

    /// Returns the first wire name declared more than once, if any.
    pub fn duplicate_field(&self) -> Option<&'static str> {
        let names: Vec<&'static str> = self.declared_fields().iter().map(|f| f.wire_name).collect();
        names
            .iter()
            .enumerate()
            .find(|(i, name)| names[..*i].contains(name))
            .map(|(_, name)| *name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static BASE: Shape = Shape {
        name: "Base",
        parent: None,
        fields: &[FieldShape::scalar("a")],
    };

    static CHILD: Shape = Shape {
        name: "Child",
        parent: Some(&BASE),
        fields: &[FieldShape::scalar("b"), FieldShape::new("c", FieldKind::Inherit)],
    };

    static DUPLICATED: Shape = Shape {
        name: "Duplicated",
        parent: Some(&BASE),
        fields: &[FieldShape::scalar("a")],
    };

    #[test]
    fn test_declared_fields_include_parent_first() {
        let names: Vec<_> = CHILD.declared_fields().iter().map(|f| f.wire_name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_field_lookup() {
        assert!(CHILD.declares("a"));
        assert!(CHILD.declares("c"));
        assert!(!CHILD.declares("d"));
        assert!(!BASE.declares("b"));
    }

    #[test]
    fn test_duplicate_field_detection() {
        assert_eq!(CHILD.duplicate_field(), None);
        assert_eq!(DUPLICATED.duplicate_field(), Some("a"));
    }
}
