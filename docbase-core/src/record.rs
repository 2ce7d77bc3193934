//! Record conversion between public and internal form.
//!
//! Stored documents keep their identity under the store's `_id` key; the
//! public shape of a record carries it as `id`. A [`RecordSchema`] is the
//! validator/transform pair that moves records across that boundary. The
//! conversions are pure: converting to internal form and back yields an
//! equal record.
//!
//! [`SerdeSchema`] covers the common case of serde-shaped records.
//! [`DocumentSchema`] passes raw BSON documents through with only the
//! identity rename, for collections used schemaless.

use bson::{Bson, Document, de::deserialize_from_document, ser::serialize_to_document};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;

use crate::error::StoreResult;

/// A record shape with a logical string identity.
///
/// Records handled by the identity overlay implement this to expose their
/// `id` field. An unassigned identity (`None`) is legal before create, where
/// one is generated.
///
/// # Example
///
/// ```ignore
/// use docbase::record::Identifiable;
///
/// #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
/// pub struct Dummy {
///     #[serde(default)]
///     pub id: Option<String>,
///     pub key: String,
/// }
///
/// impl Identifiable for Dummy {
///     fn id(&self) -> Option<&str> {
///         self.id.as_deref()
///     }
/// }
/// ```
pub trait Identifiable {
    /// Returns the logical identity of this record, when assigned.
    fn id(&self) -> Option<&str>;
}

impl Identifiable for Document {
    fn id(&self) -> Option<&str> {
        self.get("id").and_then(Bson::as_str)
    }
}

/// Converts records between their public shape and the stored document form.
///
/// Implementations must be pure: no IO, no hidden state. A failed
/// conversion is a hard [`Serialization`](crate::error::StoreError::Serialization)
/// error, never a silently skipped record.
pub trait RecordSchema<T>: Send + Sync {
    /// Converts a public record into its stored document form.
    ///
    /// The public `id`, when assigned, moves to the internal `_id` key.
    fn to_internal(&self, item: &T) -> StoreResult<Document>;

    /// Converts a stored document into its public shape.
    ///
    /// The internal `_id` is stripped and substituted as the public `id`.
    fn to_public(&self, doc: Document) -> StoreResult<T>;

    /// Converts a partial field map for use in patch updates.
    ///
    /// The default implementation drops the public identity field, since
    /// identity is not patchable.
    fn to_internal_partial(&self, mut fields: Document) -> StoreResult<Document> {
        fields.remove("id");
        Ok(fields)
    }

    /// Validates a stored document before it is written.
    ///
    /// The default implementation accepts everything; schemas with
    /// structural constraints override this.
    fn validate(&self, _doc: &Document) -> StoreResult<()> {
        Ok(())
    }
}

/// A [`RecordSchema`] for serde-shaped records.
///
/// Serialization goes through BSON, so the record's field types must be
/// representable as BSON values. The identity field must be named `id`; use
/// `#[serde(default)]` on it when it is optional, so documents stored
/// without one still decode.
pub struct SerdeSchema<T> {
    marker: PhantomData<T>,
}

impl<T> SerdeSchema<T> {
    /// Creates the schema. It carries no state.
    pub fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordSchema<T> for SerdeSchema<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn to_internal(&self, item: &T) -> StoreResult<Document> {
        let mut doc = serialize_to_document(item)?;
        if let Some(id) = doc.remove("id") {
            // An unassigned identity serializes as null; leave it out so
            // the store (or the identity overlay) can assign one.
            if !matches!(id, Bson::Null) {
                doc.insert("_id", id);
            }
        }
        Ok(doc)
    }

    fn to_public(&self, mut doc: Document) -> StoreResult<T> {
        if let Some(id) = doc.remove("_id") {
            doc.insert("id", id);
        }
        Ok(deserialize_from_document(doc)?)
    }
}

/// The identity schema for schemaless use, where records are raw BSON
/// documents.
///
/// Only the `id`/`_id` rename is applied; everything else passes through
/// untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentSchema;

impl RecordSchema<Document> for DocumentSchema {
    fn to_internal(&self, item: &Document) -> StoreResult<Document> {
        let mut doc = item.clone();
        if let Some(id) = doc.remove("id") {
            if !matches!(id, Bson::Null) {
                doc.insert("_id", id);
            }
        }
        Ok(doc)
    }

    fn to_public(&self, mut doc: Document) -> StoreResult<Document> {
        if let Some(id) = doc.remove("_id") {
            doc.insert("id", id);
        }
        Ok(doc)
    }
}

/// Generates a globally unique record identity.
///
/// The result is a 32 character lowercase hex GUID, safe to assign without
/// coordination between writers.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Dummy {
        #[serde(default)]
        id: Option<String>,
        key: String,
        content: String,
    }

    impl Identifiable for Dummy {
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }
    }

    fn schema() -> SerdeSchema<Dummy> {
        SerdeSchema::new()
    }

    #[test]
    fn to_internal_moves_id() {
        let item = Dummy {
            id: Some("1".into()),
            key: "key 1".into(),
            content: "content 1".into(),
        };
        let doc = schema().to_internal(&item).unwrap();
        assert_eq!(doc.get("_id"), Some(&Bson::String("1".into())));
        assert_eq!(doc.get("id"), None);
    }

    #[test]
    fn unassigned_id_is_left_out() {
        let item = Dummy {
            id: None,
            key: "key 1".into(),
            content: "content 1".into(),
        };
        let doc = schema().to_internal(&item).unwrap();
        assert_eq!(doc.get("_id"), None);
        assert_eq!(doc.get("id"), None);
    }

    #[test]
    fn round_trip_is_identity() {
        let item = Dummy {
            id: Some("42".into()),
            key: "key 42".into(),
            content: "content 42".into(),
        };
        let doc = schema().to_internal(&item).unwrap();
        let back = schema().to_public(doc).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn public_form_never_leaks_internal_id() {
        let stored = doc! { "_id": "7", "key": "key 7", "content": "content 7" };
        let item = schema().to_public(stored).unwrap();
        assert_eq!(item.id.as_deref(), Some("7"));
    }

    #[test]
    fn partial_conversion_strips_identity() {
        let patch = doc! { "id": "9", "content": "updated" };
        let converted = schema().to_internal_partial(patch).unwrap();
        assert_eq!(converted, doc! { "content": "updated" });
    }

    #[test]
    fn document_schema_only_renames() {
        let raw = doc! { "id": "3", "anything": { "nested": true } };
        let internal = DocumentSchema.to_internal(&raw).unwrap();
        assert_eq!(internal.get("_id"), Some(&Bson::String("3".into())));
        assert_eq!(internal.get("anything"), raw.get("anything"));

        let public = DocumentSchema.to_public(internal).unwrap();
        assert_eq!(public.id(), Some("3"));
    }

    #[test]
    fn generated_ids_are_32_hex_chars() {
        let id = generate_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_id());
    }
}
