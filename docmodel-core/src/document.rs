//! Traits for values that models read and write.
//!
//! Models are generic over the shape `T` of their documents. Any serde type that
//! round-trips through a BSON document qualifies, the [`Document`] trait is
//! implemented automatically.

use bson::{
    Document as BsonDocument,
    de::deserialize_from_document,
    ser::serialize_to_document,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Shape of the documents a model returns.
///
/// # Example
///
/// ```ignore
/// use bson::oid::ObjectId;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     pub id: Option<ObjectId>,
///     pub name: String,
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {}

impl<T> Document for T where T: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {}

/// Conversion between typed values and BSON documents.
pub trait DocumentExt: Sized {
    /// Serializes `self`, which must serialize to a map.
    fn to_bson_document(&self) -> DocumentStoreResult<BsonDocument>;

    fn from_bson_document(document: BsonDocument) -> DocumentStoreResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_bson_document(&self) -> DocumentStoreResult<BsonDocument> {
        Ok(serialize_to_document(self)?)
    }

    fn from_bson_document(document: BsonDocument) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_document(document)?)
    }
}

/// Serializes any write input (a typed value, a `doc!` literal, a map) into a document.
pub(crate) fn to_input_document<I: Serialize + ?Sized>(input: &I) -> DocumentStoreResult<BsonDocument> {
    serialize_to_document(input).map_err(|err| {
        DocumentStoreError::Serialization(format!("write input must serialize to a document: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use bson::{doc, oid::ObjectId};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        name: String,
    }

    #[test]
    fn typed_values_convert_both_ways() {
        let id = ObjectId::new();
        let user = User { id: Some(id), name: "Ada".into() };

        let document = user.to_bson_document().unwrap();
        assert_eq!(document, doc! { "_id": id, "name": "Ada" });
        assert_eq!(User::from_bson_document(document).unwrap(), user);
    }

    #[test]
    fn missing_fields_fail_to_deserialize() {
        assert!(matches!(
            User::from_bson_document(doc! { "_id": ObjectId::new() }),
            Err(DocumentStoreError::Serialization(_))
        ));
    }

    #[test]
    fn non_map_input_is_rejected() {
        assert!(matches!(to_input_document(&5), Err(DocumentStoreError::Serialization(_))));
        assert_eq!(to_input_document(&doc! { "a": 1 }).unwrap(), doc! { "a": 1 });
    }
}
