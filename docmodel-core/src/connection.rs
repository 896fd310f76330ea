//! Connection lifecycle.
//!
//! A [`ConnectionManager`] owns the one live database handle of an application. It is
//! created once at startup, connected with a connection string, and then passed by
//! reference to every [`Model`]:
//!
//! ```ignore
//! use docmodel::{prelude::*, memory::InMemoryClient};
//!
//! let manager = ConnectionManager::<InMemoryClient>::new();
//! manager.connect("memory://local/app").await?;
//!
//! let users = manager.model::<User>("users");
//! ```
//!
//! Connecting again replaces the stored handle. The previous client is not closed;
//! set up connections once, before models are used.

use mea::rwlock::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    backend::{DatabaseBackend, StoreClient},
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
    model::Model,
    url::parse_connection_url,
    validate::Validator,
};

/// Holds the live database handle of a store driver `C`.
#[derive(Debug)]
pub struct ConnectionManager<C: StoreClient> {
    config: C::Config,
    state: RwLock<Option<C::Database>>,
}

impl<C: StoreClient> Default for ConnectionManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: StoreClient> ConnectionManager<C> {
    /// Creates a manager using the driver's default configuration.
    pub fn new() -> Self {
        Self::with_config(C::Config::default())
    }

    /// Creates a manager that opens its client with `config`.
    pub fn with_config(config: C::Config) -> Self {
        Self {
            config,
            state: RwLock::new(None),
        }
    }

    /// Returns the driver configuration used for new connections.
    pub fn config(&self) -> &C::Config {
        &self.config
    }

    /// Connects to the database named in `url` and stores the handle.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidUrl`] for a malformed connection string,
    /// or the driver's error if the client cannot be opened or connected. On error
    /// the previously stored handle, if any, is kept.
    pub async fn connect(&self, url: &str) -> DocumentStoreResult<C::Database> {
        self.connect_with(url, |_| {}).await
    }

    /// Like [`ConnectionManager::connect`], calling `on_ready` once the handle is stored.
    pub async fn connect_with<F>(&self, url: &str, on_ready: F) -> DocumentStoreResult<C::Database>
    where
        F: FnOnce(&C::Database) + Send,
    {
        let url = parse_connection_url(url)?;

        let client = C::open(&url.endpoint, &self.config).await?;
        client.connect().await?;

        let database = client.database(&url.database_name);

        {
            let mut state = self.state.write().await;

            if let Some(previous) = state.as_ref() {
                warn!(
                    previous = previous.name(),
                    database = database.name(),
                    "replacing live database handle without closing the previous client"
                );
            }

            *state = Some(database.clone());
        }

        info!(database = database.name(), "connected to document store");

        on_ready(&database);

        Ok(database)
    }

    /// Returns the live database handle.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::ConnectionNotEstablished`] if no `connect` call has succeeded.
    pub async fn handle(&self) -> DocumentStoreResult<C::Database> {
        self.state
            .read()
            .await
            .clone()
            .ok_or(DocumentStoreError::ConnectionNotEstablished)
    }

    /// Returns whether a `connect` call has succeeded.
    pub async fn is_connected(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Creates a model for `collection` without a validator.
    pub fn model<T: Document>(&self, collection: &str) -> Model<'_, T, C> {
        debug!(collection, "creating model");
        Model::new(self, collection, None)
    }

    /// Creates a model for `collection` that validates writes with `validator`.
    pub fn model_with<T: Document>(
        &self,
        collection: &str,
        validator: impl Validator + 'static,
    ) -> Model<'_, T, C> {
        debug!(collection, "creating validated model");
        Model::new(self, collection, Some(Arc::new(validator)))
    }
}
