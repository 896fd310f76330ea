//! Conversion between hex identifier strings and the store's [`ObjectId`] type.

use bson::{Bson, oid::ObjectId};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Name of the identifier field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// Returns `true` when `hex` is a 24 character hexadecimal object id.
pub fn is_valid_identifier(hex: &str) -> bool {
    hex.len() == 24 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Converts a 24 character hex string into an [`ObjectId`].
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidIdentifier`] if `hex` is malformed.
pub fn to_identifier(hex: &str) -> DocumentStoreResult<ObjectId> {
    if !is_valid_identifier(hex) {
        return Err(DocumentStoreError::InvalidIdentifier(hex.to_string()));
    }

    ObjectId::parse_str(hex).map_err(|_| DocumentStoreError::InvalidIdentifier(hex.to_string()))
}

/// Reads an identifier out of the value found under `_id` in a filter.
///
/// Hex strings are converted, object ids are taken as-is. Any other value
/// (numbers, operator documents) is rejected.
pub fn identifier_from_bson(value: &Bson) -> DocumentStoreResult<ObjectId> {
    match value {
        Bson::ObjectId(id) => Ok(*id),
        Bson::String(hex) => to_identifier(hex),
        other => Err(DocumentStoreError::InvalidIdentifier(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    const HEX: &str = "507f1f77bcf86cd799439011";

    #[test]
    fn accepts_24_hex_chars() {
        assert!(is_valid_identifier(HEX));
        assert!(is_valid_identifier("507F1F77BCF86CD799439011"));
        assert_eq!(to_identifier(HEX).unwrap().to_hex(), HEX);
    }

    #[test]
    fn rejects_wrong_length_or_alphabet() {
        for hex in ["", "abc", "not-24-hex-chars", "507f1f77bcf86cd79943901z", "507f1f77bcf86cd7994390111"] {
            assert!(!is_valid_identifier(hex));
            assert!(matches!(
                to_identifier(hex),
                Err(DocumentStoreError::InvalidIdentifier(value)) if value == hex
            ));
        }
    }

    #[test]
    fn reads_identifier_from_filter_values() {
        let id = ObjectId::new();

        assert_eq!(identifier_from_bson(&Bson::ObjectId(id)).unwrap(), id);
        assert_eq!(identifier_from_bson(&Bson::String(id.to_hex())).unwrap(), id);
        assert!(identifier_from_bson(&Bson::Int32(7)).is_err());
        assert!(identifier_from_bson(&Bson::Document(doc! { "$in": [HEX] })).is_err());
    }
}
