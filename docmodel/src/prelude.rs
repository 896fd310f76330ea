//! Convenient re-exports of commonly used types from docmodel.
//!
//! ```ignore
//! use docmodel::prelude::*;
//! ```

pub use docmodel_core::{
    backend::{CollectionBackend, DatabaseBackend, StoreClient},
    connection::ConnectionManager,
    document::{Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult, ValidationError, ValidationOutcome},
    model::{Model, OperationResult},
    options::{
        DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions,
        ReturnDocument, Sort, SortDirection, UpdateOptions,
    },
    query::{Expr, FieldOp, Filter, QueryVisitor},
    validate::Validator,
};
