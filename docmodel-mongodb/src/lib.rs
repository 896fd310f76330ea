//! MongoDB store driver for docmodel.
//!
//! This crate implements the store driver traits on top of the official async
//! MongoDB driver. Filters, updates and results are passed to the server as-is.
//!
//! To use this driver, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docmodel = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The connection string given to `ConnectionManager::connect` names the database
//! (`mongodb://localhost:27017/app`). Everything before the database segment, plus
//! any query options, is parsed by the driver. Pool sizes and timeouts can be set
//! with [`MongoClientConfig`].
//!
//! # Example
//!
//! ```ignore
//! use docmodel::{prelude::*, mongodb::{MongoClient, MongoClientConfig}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = ConnectionManager::<MongoClient>::with_config(
//!         MongoClientConfig::builder().app_name("billing").build(),
//!     );
//!     manager.connect("mongodb://localhost:27017/billing").await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_mongodb;

pub mod client;
pub mod config;

pub use client::{MongoClient, MongoCollection, MongoDatabase};
pub use config::{MongoClientConfig, MongoClientConfigBuilder};
