//! In-memory store driver for docmodel.
//!
//! This crate implements the store driver traits over a thread-safe, in-memory
//! document map. It understands the common filter operators, `$set` and `$unset`
//! updates, sorting, skip and limit, and is meant for development and tests.
//!
//! # Features
//!
//! - **Shared state** - Every client opened with one [`InMemoryConfig`] sees the same data
//! - **Store semantics** - Generated `ObjectId`s, duplicate `_id` rejection, array equality
//! - **Operation log** - [`InMemoryStore::operations`] lists the collection calls issued
//!
//! # Quick Start
//!
//! ```ignore
//! use docmodel::{prelude::*, memory::{InMemoryClient, InMemoryConfig, InMemoryStore}};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryStore::new();
//!     let manager = ConnectionManager::<InMemoryClient>::with_config(InMemoryConfig::new(store.clone()));
//!     manager.connect("memory://local/app").await?;
//!
//!     let users = manager.model::<bson::Document>("users");
//!     users.insert(&doc! { "name": "Alice" }, None).await?;
//!
//!     assert_eq!(store.documents("app", "users").await.len(), 1);
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_memory;

pub mod client;
mod evaluator;
pub mod store;

pub use client::{InMemoryClient, InMemoryCollection, InMemoryConfig, InMemoryDatabase};
pub use store::{InMemoryStore, OperationKind, RecordedOperation};
