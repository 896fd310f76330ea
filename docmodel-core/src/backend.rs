//! Store driver abstraction consumed by the connection manager and models.
//!
//! A driver is described by three traits, one per level of the store hierarchy:
//!
//! - [`StoreClient`]: opens a client against an endpoint and establishes the connection
//! - [`DatabaseBackend`]: a handle on one logical database, hands out collection handles
//! - [`CollectionBackend`]: the document operations the model issues
//!
//! Filters, updates and results are driver-native BSON documents and are passed
//! through unchanged. Options use the types from [`crate::options`], which each
//! driver maps onto its own option types.
//!
//! # Example
//!
//! ```ignore
//! use docmodel::backend::{StoreClient, DatabaseBackend, CollectionBackend};
//! use bson::doc;
//!
//! let client = MyClient::open("mongodb://localhost:27017", &Default::default()).await?;
//! client.connect().await?;
//!
//! let users = client.database("app").collection("users");
//! users.insert_one(doc! { "name": "Alice" }, Default::default()).await?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use std::fmt::Debug;

use crate::{
    error::DocumentStoreResult,
    options::{
        DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions,
        UpdateOptions,
    },
};

/// Entry point of a store driver.
///
/// # Thread Safety
///
/// Clients and the handles they produce must be `Send + Sync`; handles are cloned
/// freely and shared between models.
#[async_trait]
pub trait StoreClient: Send + Sync + Debug + Sized + 'static {
    /// Driver specific configuration applied when the client is opened.
    type Config: Default + Debug + Send + Sync;
    /// Handle on a selected logical database.
    type Database: DatabaseBackend;

    /// Creates a client for `endpoint` (`<scheme>://<authority>[/?options]`).
    ///
    /// Opening does not have to contact the server, [`StoreClient::connect`] does.
    async fn open(endpoint: &str, config: &Self::Config) -> DocumentStoreResult<Self>;

    /// Establishes the connection, failing if the store cannot be reached.
    async fn connect(&self) -> DocumentStoreResult<()>;

    /// Selects a logical database.
    fn database(&self, name: &str) -> Self::Database;
}

/// A handle on one logical database.
pub trait DatabaseBackend: Send + Sync + Debug + Clone + 'static {
    /// Handle on a single collection of this database.
    type Collection: CollectionBackend;

    /// Returns the name of the selected database.
    fn name(&self) -> &str;

    /// Returns a handle on the named collection.
    ///
    /// Collections are created implicitly on first write.
    fn collection(&self, name: &str) -> Self::Collection;
}

/// Document operations on one collection.
///
/// Every method is a single store call. Failures raised by the store are returned
/// as [`DocumentStoreError::Backend`](crate::error::DocumentStoreError::Backend).
#[async_trait]
pub trait CollectionBackend: Send + Sync + Debug + Clone + 'static {
    /// Returns the name of this collection.
    fn name(&self) -> &str;

    /// Returns all documents matching `filter`. An empty filter matches everything.
    async fn find(
        &self,
        filter: BsonDocument,
        options: FindOptions,
    ) -> DocumentStoreResult<Vec<BsonDocument>>;

    /// Returns the first document matching `filter`.
    async fn find_one(
        &self,
        filter: BsonDocument,
        options: FindOneOptions,
    ) -> DocumentStoreResult<Option<BsonDocument>>;

    /// Inserts one document and returns its `_id`, assigning one if the document has none.
    async fn insert_one(
        &self,
        document: BsonDocument,
        options: InsertOneOptions,
    ) -> DocumentStoreResult<Bson>;

    /// Inserts documents in order and returns their `_id`s in the same order.
    async fn insert_many(
        &self,
        documents: Vec<BsonDocument>,
        options: InsertManyOptions,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Applies `update` (an update operator document such as `{ "$set": ... }`) to the
    /// first document matching `filter` and returns it, before or after the change
    /// depending on `options.return_document`.
    async fn find_one_and_update(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
        options: UpdateOptions,
    ) -> DocumentStoreResult<Option<BsonDocument>>;

    /// Removes the first document matching `filter` and returns it.
    async fn find_one_and_delete(
        &self,
        filter: BsonDocument,
        options: DeleteOptions,
    ) -> DocumentStoreResult<Option<BsonDocument>>;
}
