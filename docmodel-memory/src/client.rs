//! Store driver implementation over [`InMemoryStore`].

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};

use docmodel_core::{
    backend::{CollectionBackend, DatabaseBackend, StoreClient},
    error::{DocumentStoreError, DocumentStoreResult},
    options::{
        DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions,
        UpdateOptions,
    },
};

use crate::store::{InMemoryStore, OperationKind};

/// Configuration of [`InMemoryClient`].
///
/// Every client opened with the same configuration shares its store. The default
/// configuration carries a fresh, empty store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfig {
    pub store: InMemoryStore,
}

impl InMemoryConfig {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

/// A client of an [`InMemoryStore`]. Any endpoint with a scheme is accepted.
#[derive(Debug, Clone)]
pub struct InMemoryClient {
    endpoint: String,
    store: InMemoryStore,
}

impl InMemoryClient {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StoreClient for InMemoryClient {
    type Config = InMemoryConfig;
    type Database = InMemoryDatabase;

    async fn open(endpoint: &str, config: &Self::Config) -> DocumentStoreResult<Self> {
        if !endpoint.contains("://") {
            return Err(DocumentStoreError::Initialization(format!(
                "endpoint `{endpoint}` has no scheme"
            )));
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            store: config.store.clone(),
        })
    }

    async fn connect(&self) -> DocumentStoreResult<()> {
        Ok(())
    }

    fn database(&self, name: &str) -> Self::Database {
        InMemoryDatabase {
            name: name.to_string(),
            store: self.store.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryDatabase {
    name: String,
    store: InMemoryStore,
}

impl DatabaseBackend for InMemoryDatabase {
    type Collection = InMemoryCollection;

    fn name(&self) -> &str {
        &self.name
    }

    fn collection(&self, name: &str) -> Self::Collection {
        InMemoryCollection {
            database: self.name.clone(),
            name: name.to_string(),
            store: self.store.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryCollection {
    database: String,
    name: String,
    store: InMemoryStore,
}

#[async_trait]
impl CollectionBackend for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(
        &self,
        filter: BsonDocument,
        options: FindOptions,
    ) -> DocumentStoreResult<Vec<BsonDocument>> {
        self.store
            .find(
                &self.database,
                &self.name,
                &filter,
                &options.sort,
                options.skip,
                options.limit,
                OperationKind::Find,
            )
            .await
    }

    async fn find_one(
        &self,
        filter: BsonDocument,
        options: FindOneOptions,
    ) -> DocumentStoreResult<Option<BsonDocument>> {
        Ok(self
            .store
            .find(
                &self.database,
                &self.name,
                &filter,
                &options.sort,
                options.skip,
                Some(1),
                OperationKind::FindOne,
            )
            .await?
            .into_iter()
            .next())
    }

    async fn insert_one(
        &self,
        document: BsonDocument,
        _options: InsertOneOptions,
    ) -> DocumentStoreResult<Bson> {
        self.store
            .insert(&self.database, &self.name, vec![document], OperationKind::InsertOne)
            .await?
            .pop()
            .ok_or_else(|| DocumentStoreError::Backend("insert returned no identifier".to_string()))
    }

    async fn insert_many(
        &self,
        documents: Vec<BsonDocument>,
        _options: InsertManyOptions,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.store
            .insert(&self.database, &self.name, documents, OperationKind::InsertMany)
            .await
    }

    async fn find_one_and_update(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
        options: UpdateOptions,
    ) -> DocumentStoreResult<Option<BsonDocument>> {
        self.store
            .find_one_and_update(
                &self.database,
                &self.name,
                &filter,
                &update,
                &options.sort,
                options.upsert.unwrap_or(false),
                options.return_document,
            )
            .await
    }

    async fn find_one_and_delete(
        &self,
        filter: BsonDocument,
        options: DeleteOptions,
    ) -> DocumentStoreResult<Option<BsonDocument>> {
        self.store
            .find_one_and_delete(&self.database, &self.name, &filter, &options.sort)
            .await
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[tokio::test]
    async fn clients_with_one_config_share_the_store() {
        let config = InMemoryConfig::default();

        let writer = InMemoryClient::open("memory://local", &config).await.unwrap();
        let reader = InMemoryClient::open("memory://other", &config).await.unwrap();

        writer
            .database("app")
            .collection("users")
            .insert_one(doc! { "name": "Ada" }, InsertOneOptions::default())
            .await
            .unwrap();

        let found = reader
            .database("app")
            .collection("users")
            .find_one(doc! { "name": "Ada" }, FindOneOptions::default())
            .await
            .unwrap();

        assert!(found.is_some());
    }

    #[tokio::test]
    async fn databases_are_isolated() {
        let client = InMemoryClient::open("memory://local", &InMemoryConfig::default()).await.unwrap();

        client
            .database("one")
            .collection("users")
            .insert_one(doc! { "name": "Ada" }, InsertOneOptions::default())
            .await
            .unwrap();

        let found = client
            .database("two")
            .collection("users")
            .find(doc! {}, FindOptions::default())
            .await
            .unwrap();

        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn endpoint_without_scheme_is_rejected() {
        assert!(matches!(
            InMemoryClient::open("localhost", &InMemoryConfig::default()).await,
            Err(DocumentStoreError::Initialization(_))
        ));
    }
}
