//! The field-level contract shared by every decodable object.

use crate::codec::fields::{DecodeOptions, FieldReader, FieldWriter};
use crate::model::shape::Shape;
use crate::model::JsonObject;

/// An object with a declared shape and lossless residue.
///
/// Implementations claim their declared keys in [`read_fields`], finishing
/// with [`FieldReader::take_residue`], and write them back in
/// [`write_fields`]. Keys the implementation does not claim survive a
/// decode/encode cycle untouched.
///
/// [`read_fields`]: Record::read_fields
/// [`write_fields`]: Record::write_fields
pub trait Record: Sized {
    /// The declared shape. Must list exactly the keys `read_fields` claims.
    fn shape() -> &'static Shape;

    /// Builds the record from a reader, taking residue last.
    fn read_fields(fields: &mut FieldReader) -> Self;

    /// Writes set fields. Residue has already been seeded into `out`.
    fn write_fields(&self, out: &mut FieldWriter);

    /// Keys that no declared field claimed.
    fn residue(&self) -> &JsonObject;

    /// Decodes a record from an object. Never fails.
    fn from_object(object: JsonObject) -> Self {
        Self::from_object_with_options(object, DecodeOptions::default())
    }

    fn from_object_with_options(object: JsonObject, options: DecodeOptions) -> Self {
        let mut reader = FieldReader::with_options(object, Self::shape().name, options);
        Self::read_fields(&mut reader)
    }

    /// Encodes the record: residue first, typed fields over it.
    fn to_object(&self) -> JsonObject {
        let mut out = FieldWriter::new(self.residue().clone());
        self.write_fields(&mut out);
        out.finish()
    }

    /// Encodes only the declared fields, dropping residue.
    fn declared_object(&self) -> JsonObject {
        let mut out = FieldWriter::default();
        self.write_fields(&mut out);
        out.finish()
    }
}
