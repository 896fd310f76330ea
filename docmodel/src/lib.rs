//! A thin, schema-validated model layer over schemaless document stores.
//!
//! This crate is the entry point of docmodel. It re-exports the core types and
//! the store drivers.
//!
//! # Features
//!
//! - **One connection per application** - [`ConnectionManager`](prelude::ConnectionManager) owns the live database handle
//! - **Validated writes** - Models check inserts and updates with a pluggable validator
//! - **Identifier routing** - Filters keyed by `_id` become identifier lookups
//! - **Uniform results** - Writes return `{ result, error }` instead of failing on invalid input
//!
//! # Quick Start
//!
//! ```ignore
//! use docmodel::{prelude::*, memory::InMemoryClient, schemas::*};
//! use bson::{doc, oid::ObjectId};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let manager = ConnectionManager::<InMemoryClient>::new();
//!     manager.connect("memory://local/app").await?;
//!
//!     let users = manager.model_with::<User>(
//!         "users",
//!         Schema::new()
//!             .field("_id", ObjectIdSchema.optional())
//!             .field("name", StringSchema::new().min_length(1)),
//!     );
//!
//!     let created = users.insert(&doc! { "name": "Alice" }, None).await?;
//!     let id = created.result.and_then(|user| user.id).map(|id| id.to_hex());
//!
//!     if let Some(id) = id {
//!         users.update_by_id(&id, &doc! { "name": "Alicia" }, None).await?;
//!         users.delete(doc! { "_id": id }, None).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Drivers
//!
//! - [`memory`] - In-memory store for development and testing
//! - [`mongodb`] - MongoDB (requires the `mongodb` feature)

pub mod prelude;

pub use docmodel_core::{
    backend, connection, document, error, identifier, model, options, query, url, validate,
};

// Re-export BSON types for convenience
pub use bson;

/// Pre-built validators.
pub mod schemas {
    pub use docmodel_core::schema::{
        BooleanSchema, FieldSchema, NumberSchema, ObjectIdSchema, Optional, Schema, StringSchema,
        UnknownFields,
    };
}

/// In-memory store driver.
pub mod memory {
    pub use docmodel_memory::{
        InMemoryClient, InMemoryCollection, InMemoryConfig, InMemoryDatabase, InMemoryStore,
        OperationKind, RecordedOperation,
    };
}

/// MongoDB store driver.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmodel_mongodb::{
        MongoClient, MongoClientConfig, MongoClientConfigBuilder, MongoCollection, MongoDatabase,
    };
}
