use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Bson, Document, doc};
use mongodb::{
    Client, Collection, Database,
    options::{
        ClientOptions,
        FindOneAndDeleteOptions as MongoDeleteOptions,
        FindOneAndUpdateOptions as MongoUpdateOptions,
        FindOneOptions as MongoFindOneOptions,
        FindOptions as MongoFindOptions,
        InsertManyOptions as MongoInsertManyOptions,
        InsertOneOptions as MongoInsertOneOptions,
        ReturnDocument as MongoReturnDocument,
    },
};
use tracing::debug;

use docmodel_core::{
    backend::{CollectionBackend, DatabaseBackend, StoreClient},
    error::{DocumentStoreError, DocumentStoreResult},
    options::{
        DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions,
        ReturnDocument, Sort, UpdateOptions,
    },
};

use crate::config::MongoClientConfig;


/// A MongoDB client. Cloning is cheap, clones share the connection pool.
#[derive(Debug, Clone)]
pub struct MongoClient {
    client: Client,
}

impl MongoClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns the underlying driver client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl StoreClient for MongoClient {
    type Config = MongoClientConfig;
    type Database = MongoDatabase;

    async fn open(endpoint: &str, config: &Self::Config) -> DocumentStoreResult<Self> {
        let mut options = ClientOptions::parse(endpoint)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        config.apply(&mut options);

        Ok(Self::new(
            Client::with_options(options)
                .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
        ))
    }

    /// Pings the server, which also selects a server and opens a pooled connection.
    async fn connect(&self) -> DocumentStoreResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        debug!("mongodb server answered ping");

        Ok(())
    }

    fn database(&self, name: &str) -> Self::Database {
        MongoDatabase {
            name: name.to_string(),
            database: self.client.database(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    name: String,
    database: Database,
}

impl MongoDatabase {
    pub fn inner(&self) -> &Database {
        &self.database
    }
}

impl DatabaseBackend for MongoDatabase {
    type Collection = MongoCollection;

    fn name(&self) -> &str {
        &self.name
    }

    fn collection(&self, name: &str) -> Self::Collection {
        MongoCollection {
            name: name.to_string(),
            collection: self.database.collection(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MongoCollection {
    name: String,
    collection: Collection<Document>,
}

#[async_trait]
impl CollectionBackend for MongoCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: Document, options: FindOptions) -> DocumentStoreResult<Vec<Document>> {
        self.collection
            .find(filter)
            .with_options(find_options(options))
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    async fn find_one(&self, filter: Document, options: FindOneOptions) -> DocumentStoreResult<Option<Document>> {
        self.collection
            .find_one(filter)
            .with_options(find_one_options(options))
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    async fn insert_one(&self, document: Document, options: InsertOneOptions) -> DocumentStoreResult<Bson> {
        Ok(self
            .collection
            .insert_one(document)
            .with_options(insert_one_options(options))
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .inserted_id)
    }

    async fn insert_many(&self, documents: Vec<Document>, options: InsertManyOptions) -> DocumentStoreResult<Vec<Bson>> {
        let count = documents.len();

        let mut inserted = self
            .collection
            .insert_many(documents)
            .with_options(insert_many_options(options))
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .inserted_ids;

        Ok((0..count)
            .map(|index| inserted.remove(&index).unwrap_or(Bson::Null))
            .collect())
    }

    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> DocumentStoreResult<Option<Document>> {
        self.collection
            .find_one_and_update(filter, update)
            .with_options(update_options(options))
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }

    async fn find_one_and_delete(&self, filter: Document, options: DeleteOptions) -> DocumentStoreResult<Option<Document>> {
        self.collection
            .find_one_and_delete(filter)
            .with_options(delete_options(options))
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))
    }
}

fn sort_document(sort: &[Sort]) -> Option<Document> {
    if sort.is_empty() {
        return None;
    }

    let mut document = Document::new();
    for key in sort {
        document.insert(key.field.clone(), key.direction.as_i32());
    }

    Some(document)
}

fn find_options(options: FindOptions) -> MongoFindOptions {
    let mut mongo = MongoFindOptions::default();

    mongo.limit = options.limit.map(|limit| limit as i64);
    mongo.skip = options.skip.map(|skip| skip as u64);
    mongo.sort = sort_document(&options.sort);

    mongo
}

fn find_one_options(options: FindOneOptions) -> MongoFindOneOptions {
    let mut mongo = MongoFindOneOptions::default();

    mongo.skip = options.skip.map(|skip| skip as u64);
    mongo.sort = sort_document(&options.sort);

    mongo
}

fn insert_one_options(options: InsertOneOptions) -> MongoInsertOneOptions {
    let mut mongo = MongoInsertOneOptions::default();
    mongo.bypass_document_validation = options.bypass_document_validation;
    mongo
}

fn insert_many_options(options: InsertManyOptions) -> MongoInsertManyOptions {
    let mut mongo = MongoInsertManyOptions::default();
    mongo.ordered = options.ordered;
    mongo.bypass_document_validation = options.bypass_document_validation;
    mongo
}

fn update_options(options: UpdateOptions) -> MongoUpdateOptions {
    let mut mongo = MongoUpdateOptions::default();

    mongo.upsert = options.upsert;
    mongo.sort = sort_document(&options.sort);
    mongo.return_document = Some(match options.return_document {
        ReturnDocument::Before => MongoReturnDocument::Before,
        ReturnDocument::After => MongoReturnDocument::After,
    });

    mongo
}

fn delete_options(options: DeleteOptions) -> MongoDeleteOptions {
    let mut mongo = MongoDeleteOptions::default();
    mongo.sort = sort_document(&options.sort);
    mongo
}
