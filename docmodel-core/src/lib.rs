//! A thin, schema-validated model layer over schemaless document stores.
//!
//! This crate is the core of the docmodel project and provides:
//!
//! - **Connection management** ([`connection`]) - One live database handle per application
//! - **Models** ([`model`]) - Validated CRUD over a single collection with `_id` routing
//! - **Validation** ([`validate`], [`schema`]) - The validator capability and pre-built schemas
//! - **Store driver abstraction** ([`backend`]) - Traits implemented by each store driver
//! - **Filters** ([`query`]) - A small expression tree that renders to filter documents
//! - **Identifiers** ([`identifier`]) - Parsing of 24 character hex object ids
//! - **Connection strings** ([`url`]) - Splitting a URL into endpoint and database name
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
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
//! let manager = ConnectionManager::<InMemoryClient>::new();
//! manager.connect("memory://local/app").await?;
//!
//! let users = manager.model_with::<User>(
//!     "users",
//!     Schema::new()
//!         .field("_id", ObjectIdSchema.optional())
//!         .field("name", StringSchema::new().min_length(1)),
//! );
//!
//! let created = users.insert(&doc! { "name": "Alice" }, None).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_core;

pub mod backend;
pub mod connection;
pub mod document;
pub mod error;
pub mod identifier;
pub mod model;
pub mod options;
pub mod query;
pub mod schema;
pub mod url;
pub mod validate;
