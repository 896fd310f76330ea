//! The validation capability consumed by models.
//!
//! A [`Validator`] checks a candidate document and returns the accepted value, which
//! may differ from the input (for example a hex string coerced into an `ObjectId`).
//! Models call it in one of three modes:
//!
//! - full, before `insert`
//! - partial, before `update`: only fields present in the patch are checked
//! - batch, before `insert_many`: element by element, stopping at the first failure
//!
//! A model without a validator passes every value through unchanged.

use bson::Document as BsonDocument;
use std::{fmt::Debug, sync::Arc};

use crate::error::ValidationOutcome;

/// Checks and transforms documents before they are written.
pub trait Validator: Send + Sync + Debug {
    /// Validates a complete document.
    fn validate_full(&self, value: BsonDocument) -> ValidationOutcome<BsonDocument>;

    /// Validates only the fields present in `value`. Absent fields are never required.
    fn validate_partial(&self, value: BsonDocument) -> ValidationOutcome<BsonDocument>;

    /// Validates a sequence with [`Validator::validate_full`], stopping at the first
    /// failing element. The error path is prefixed with that element's index.
    fn validate_batch(&self, values: Vec<BsonDocument>) -> ValidationOutcome<Vec<BsonDocument>> {
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                self.validate_full(value)
                    .map_err(|err| err.within(index.to_string()))
            })
            .collect()
    }
}

impl<V: Validator + ?Sized> Validator for Arc<V> {
    fn validate_full(&self, value: BsonDocument) -> ValidationOutcome<BsonDocument> {
        (**self).validate_full(value)
    }

    fn validate_partial(&self, value: BsonDocument) -> ValidationOutcome<BsonDocument> {
        (**self).validate_partial(value)
    }

    fn validate_batch(&self, values: Vec<BsonDocument>) -> ValidationOutcome<Vec<BsonDocument>> {
        (**self).validate_batch(values)
    }
}

/// Runs the optional validator of a model. `None` accepts everything as-is.
pub(crate) fn validate_full(
    validator: Option<&dyn Validator>,
    value: BsonDocument,
) -> ValidationOutcome<BsonDocument> {
    match validator {
        Some(validator) => validator.validate_full(value),
        None => Ok(value),
    }
}

pub(crate) fn validate_partial(
    validator: Option<&dyn Validator>,
    value: BsonDocument,
) -> ValidationOutcome<BsonDocument> {
    match validator {
        Some(validator) => validator.validate_partial(value),
        None => Ok(value),
    }
}

pub(crate) fn validate_batch(
    validator: Option<&dyn Validator>,
    values: Vec<BsonDocument>,
) -> ValidationOutcome<Vec<BsonDocument>> {
    match validator {
        Some(validator) => validator.validate_batch(values),
        None => Ok(values),
    }
}
