//! Pre-built validators.
//!
//! [`Schema`] is an object validator made of named fields, each checked by a
//! [`FieldSchema`]. It implements [`Validator`] so it can be handed to a model:
//!
//! ```ignore
//! use docmodel::schemas::{Schema, ObjectIdSchema, StringSchema, NumberSchema};
//!
//! let users = Schema::new()
//!     .field("_id", ObjectIdSchema.optional())
//!     .field("name", StringSchema::new().min_length(1))
//!     .field("age", NumberSchema::new().integer().min(0.0).optional());
//! ```
//!
//! Field schemas may transform values: [`ObjectIdSchema`] turns a 24 character hex
//! string into an `ObjectId`, and it is the transformed document that gets stored.

use bson::{Bson, Document as BsonDocument, oid::ObjectId};
use std::fmt::Debug;

use crate::{
    error::{ValidationError, ValidationOutcome},
    identifier::is_valid_identifier,
    validate::Validator,
};

/// Checks (and possibly transforms) a single value.
pub trait FieldSchema: Send + Sync + Debug {
    fn check(&self, value: Bson) -> ValidationOutcome<Bson>;

    /// Whether the field may be absent from a full document.
    fn is_optional(&self) -> bool {
        false
    }

    /// Wraps this schema so the field may be absent or `null`.
    fn optional(self) -> Optional<Self>
    where
        Self: Sized,
    {
        Optional(self)
    }
}

fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::String(_) => "string",
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => "number",
        Bson::Boolean(_) => "boolean",
        Bson::Document(_) => "object",
        Bson::Array(_) => "array",
        Bson::Null | Bson::Undefined => "null",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        _ => "unknown",
    }
}

fn unexpected(expected: &str, received: &Bson) -> ValidationError {
    ValidationError::new(format!(
        "Expected {expected}, received {}",
        type_name(received)
    ))
}

/// Accepts a 24 character hex string and turns it into an [`ObjectId`].
///
/// Values that already are object ids are accepted unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdSchema;

impl FieldSchema for ObjectIdSchema {
    fn check(&self, value: Bson) -> ValidationOutcome<Bson> {
        match value {
            Bson::ObjectId(id) => Ok(Bson::ObjectId(id)),
            Bson::String(hex) => {
                if hex.len() != 24 {
                    return Err(ValidationError::new(
                        "String must contain exactly 24 character(s)",
                    ));
                }
                if !is_valid_identifier(&hex) {
                    return Err(ValidationError::new("Invalid ObjectId"));
                }

                ObjectId::parse_str(&hex)
                    .map(Bson::ObjectId)
                    .map_err(|_| ValidationError::new("Invalid ObjectId"))
            }
            other => Err(unexpected("string", &other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl StringSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

impl FieldSchema for StringSchema {
    fn check(&self, value: Bson) -> ValidationOutcome<Bson> {
        let Bson::String(s) = &value else {
            return Err(unexpected("string", &value));
        };

        let length = s.chars().count();

        if let Some(min) = self.min_length.filter(|min| length < *min) {
            return Err(ValidationError::new(format!(
                "String must contain at least {min} character(s)"
            )));
        }
        if let Some(max) = self.max_length.filter(|max| length > *max) {
            return Err(ValidationError::new(format!(
                "String must contain at most {max} character(s)"
            )));
        }

        Ok(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    min: Option<f64>,
    max: Option<f64>,
    integer: bool,
}

impl NumberSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Rejects values with a fractional part.
    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }
}

impl FieldSchema for NumberSchema {
    fn check(&self, value: Bson) -> ValidationOutcome<Bson> {
        let number = match &value {
            Bson::Int32(n) => *n as f64,
            Bson::Int64(n) => *n as f64,
            Bson::Double(n) => *n,
            other => return Err(unexpected("number", other)),
        };

        if self.integer && number.fract() != 0.0 {
            return Err(unexpected("integer", &value));
        }
        if let Some(min) = self.min.filter(|min| number < *min) {
            return Err(ValidationError::new(format!(
                "Number must be greater than or equal to {min}"
            )));
        }
        if let Some(max) = self.max.filter(|max| number > *max) {
            return Err(ValidationError::new(format!(
                "Number must be less than or equal to {max}"
            )));
        }

        Ok(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanSchema;

impl FieldSchema for BooleanSchema {
    fn check(&self, value: Bson) -> ValidationOutcome<Bson> {
        match value {
            Bson::Boolean(flag) => Ok(Bson::Boolean(flag)),
            other => Err(unexpected("boolean", &other)),
        }
    }
}

/// A field that may be absent or `null`. Present values are checked by the inner schema.
#[derive(Debug, Clone)]
pub struct Optional<S>(pub S);

impl<S: FieldSchema> FieldSchema for Optional<S> {
    fn check(&self, value: Bson) -> ValidationOutcome<Bson> {
        match value {
            Bson::Null => Ok(Bson::Null),
            value => self.0.check(value),
        }
    }

    fn is_optional(&self) -> bool {
        true
    }
}

/// What a [`Schema`] does with fields it does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownFields {
    /// Drop them from the accepted document.
    #[default]
    Strip,
    /// Keep them unchanged after the declared fields.
    Passthrough,
}

/// Object validator built from named field schemas.
#[derive(Debug, Default)]
pub struct Schema {
    fields: Vec<(String, Box<dyn FieldSchema>)>,
    unknown_fields: UnknownFields,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. Fields are checked, and emitted, in declaration order.
    pub fn field(mut self, name: impl Into<String>, schema: impl FieldSchema + 'static) -> Self {
        self.fields.push((name.into(), Box::new(schema)));
        self
    }

    pub fn unknown_fields(mut self, policy: UnknownFields) -> Self {
        self.unknown_fields = policy;
        self
    }

    fn check(&self, mut value: BsonDocument, partial: bool) -> ValidationOutcome<BsonDocument> {
        let mut accepted = BsonDocument::new();

        for (name, schema) in &self.fields {
            match value.remove(name) {
                Some(field) => {
                    let field = schema.check(field).map_err(|err| err.within(name.as_str()))?;
                    accepted.insert(name.clone(), field);
                }
                None if partial || schema.is_optional() => {}
                None => return Err(ValidationError::at(name.as_str(), "Required")),
            }
        }

        if self.unknown_fields == UnknownFields::Passthrough {
            for (name, field) in value {
                accepted.insert(name, field);
            }
        }

        Ok(accepted)
    }
}

impl Validator for Schema {
    fn validate_full(&self, value: BsonDocument) -> ValidationOutcome<BsonDocument> {
        self.check(value, false)
    }

    fn validate_partial(&self, value: BsonDocument) -> ValidationOutcome<BsonDocument> {
        self.check(value, true)
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    const HEX: &str = "507f1f77bcf86cd799439011";

    fn users() -> Schema {
        Schema::new()
            .field("_id", ObjectIdSchema.optional())
            .field("name", StringSchema::new().min_length(1))
            .field("age", NumberSchema::new().integer().min(0.0).optional())
            .field("active", BooleanSchema.optional())
    }

    #[test]
    fn object_id_schema_transforms_hex() {
        let id = ObjectIdSchema.check(Bson::String(HEX.to_string())).unwrap();
        assert_eq!(id, Bson::ObjectId(ObjectId::parse_str(HEX).unwrap()));
    }

    #[test]
    fn object_id_schema_rejects_malformed_values() {
        let err = ObjectIdSchema.check(Bson::String("abc".into())).unwrap_err();
        assert_eq!(err.message, "String must contain exactly 24 character(s)");

        let err = ObjectIdSchema
            .check(Bson::String("zzzzzzzzzzzzzzzzzzzzzzzz".into()))
            .unwrap_err();
        assert_eq!(err.message, "Invalid ObjectId");

        let err = ObjectIdSchema.check(Bson::Int32(1)).unwrap_err();
        assert_eq!(err.message, "Expected string, received number");
    }

    #[test]
    fn full_validation_requires_declared_fields() {
        let err = users().validate_full(doc! { "age": 3 }).unwrap_err();
        assert_eq!(err.path.as_deref(), Some("name"));
        assert_eq!(err.message, "Required");
    }

    #[test]
    fn full_validation_transforms_and_strips() {
        let accepted = users()
            .validate_full(doc! { "_id": HEX, "name": "Ada", "extra": true })
            .unwrap();

        assert_eq!(accepted, doc! {
            "_id": ObjectId::parse_str(HEX).unwrap(),
            "name": "Ada",
        });
    }

    #[test]
    fn passthrough_keeps_unknown_fields() {
        let accepted = users()
            .unknown_fields(UnknownFields::Passthrough)
            .validate_full(doc! { "name": "Ada", "extra": true })
            .unwrap();

        assert_eq!(accepted, doc! { "name": "Ada", "extra": true });
    }

    #[test]
    fn partial_validation_only_checks_present_fields() {
        assert_eq!(users().validate_partial(doc! { "age": 4 }).unwrap(), doc! { "age": 4 });

        let err = users().validate_partial(doc! { "name": "" }).unwrap_err();
        assert_eq!(err.path.as_deref(), Some("name"));
        assert_eq!(err.message, "String must contain at least 1 character(s)");
    }

    #[test]
    fn invalid_identifier_in_document_reports_its_path() {
        let err = users().validate_full(doc! { "_id": "abc", "name": "x" }).unwrap_err();
        assert_eq!(err.path.as_deref(), Some("_id"));
    }

    #[test]
    fn number_constraints() {
        let schema = NumberSchema::new().integer().min(0.0).max(10.0);

        assert!(schema.check(Bson::Int32(3)).is_ok());
        assert!(schema.check(Bson::Double(3.0)).is_ok());
        assert_eq!(schema.check(Bson::Double(3.5)).unwrap_err().message, "Expected integer, received number");
        assert!(schema.check(Bson::Int64(-1)).is_err());
        assert!(schema.check(Bson::Int64(11)).is_err());
        assert!(schema.check(Bson::String("3".into())).is_err());
    }

    #[test]
    fn optional_accepts_null() {
        assert_eq!(StringSchema::new().optional().check(Bson::Null).unwrap(), Bson::Null);
        assert!(StringSchema::new().check(Bson::Null).is_err());
    }

    #[test]
    fn batch_reports_first_failing_index() {
        let err = users()
            .validate_batch(vec![
                doc! { "name": "a" },
                doc! { "name": "b", "age": -2 },
                doc! { "name": 3 },
            ])
            .unwrap_err();

        assert_eq!(err.path.as_deref(), Some("1.age"));
    }
}
