//! Schema-validated CRUD over one collection.
//!
//! A [`Model`] is bound to a collection name, an optional [`Validator`] and the
//! [`ConnectionManager`] it reads its database handle from. The collection handle
//! is resolved on first use and cached for the lifetime of the model.
//!
//! Filters that contain `_id` are routed to the matching `*_by_id` operation, which
//! only looks at the identifier and ignores every other key of the filter.
//!
//! Writes never fail on invalid input. A rejected document produces an
//! [`OperationResult`] carrying the [`ValidationError`] and the store is not called:
//!
//! ```ignore
//! let outcome = users.insert(&doc! { "name": 42 }, None).await?;
//! assert!(outcome.result.is_none());
//! assert!(outcome.error.is_some());
//! ```

use bson::{Bson, Document as BsonDocument, doc, oid::ObjectId};
use std::{marker::PhantomData, sync::Arc};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::{
    backend::{CollectionBackend, DatabaseBackend, StoreClient},
    connection::ConnectionManager,
    document::{Document, DocumentExt, to_input_document},
    error::{DocumentStoreError, DocumentStoreResult, ValidationError},
    identifier::{ID_FIELD, identifier_from_bson, to_identifier},
    options::{
        DeleteOptions, FindOneOptions, FindOptions, InsertManyOptions, InsertOneOptions,
        UpdateOptions,
    },
    validate,
    validate::Validator,
};

type CollectionOf<C> = <<C as StoreClient>::Database as DatabaseBackend>::Collection;

/// Outcome of a write operation.
///
/// Exactly one of the two fields is meaningful: a rejected write carries `error`
/// and no `result`. A write that matched nothing has neither.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult<T> {
    pub result: Option<T>,
    pub error: Option<ValidationError>,
}

impl<T> OperationResult<T> {
    pub fn ok(result: Option<T>) -> Self {
        Self { result, error: None }
    }

    pub fn rejected(error: ValidationError) -> Self {
        Self { result: None, error: Some(error) }
    }

    /// Returns `true` unless the write was rejected by validation.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a `Result`, treating a rejection as the error.
    pub fn into_result(self) -> Result<Option<T>, ValidationError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

/// Typed, validated access to one collection.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the connection manager reference
/// * `T` - The shape of the documents read back from the collection
/// * `C` - The store driver
#[derive(Debug)]
pub struct Model<'a, T: Document, C: StoreClient> {
    name: String,
    manager: &'a ConnectionManager<C>,
    validator: Option<Arc<dyn Validator>>,
    collection: OnceCell<CollectionOf<C>>,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Document, C: StoreClient> Model<'a, T, C> {
    /// Creates a model for `name`. Nothing is resolved until the first operation.
    pub fn new(
        manager: &'a ConnectionManager<C>,
        name: impl Into<String>,
        validator: Option<Arc<dyn Validator>>,
    ) -> Self {
        Self {
            name: name.into(),
            manager,
            validator,
            collection: OnceCell::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the name of the bound collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Converts this model to a different document type, sharing the validator.
    pub fn with_type<U: Document>(&self) -> Model<'a, U, C> {
        Model::new(self.manager, self.name.clone(), self.validator.clone())
    }

    /// Resolves the collection handle, once. A failed resolution is not cached.
    async fn collection(&self) -> DocumentStoreResult<&CollectionOf<C>> {
        self.collection
            .get_or_try_init(|| async {
                let database = self.manager.handle().await?;
                debug!(
                    database = database.name(),
                    collection = %self.name,
                    "resolved collection handle"
                );
                Ok::<_, DocumentStoreError>(database.collection(&self.name))
            })
            .await
    }

    fn validator(&self) -> Option<&dyn Validator> {
        self.validator.as_deref()
    }

    /// Returns the identifier when the filter is keyed by `_id`.
    ///
    /// `{ "_id": { "$eq": id } }`, as rendered by [`Filter::eq`](crate::query::Filter::eq),
    /// counts as keyed by `id`.
    fn routed_identifier(&self, filter: &BsonDocument) -> DocumentStoreResult<Option<ObjectId>> {
        let Some(id) = filter.get(ID_FIELD) else {
            return Ok(None);
        };

        debug!(collection = %self.name, "routing `_id` filter to identifier lookup");

        let id = match id {
            Bson::Document(condition) if condition.len() == 1 => condition.get("$eq").unwrap_or(id),
            id => id,
        };

        identifier_from_bson(id).map(Some)
    }

    /// Returns every document matching `filter`. An empty filter matches everything.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if no connection
    /// is established, an `_id` value is malformed, or the store call fails.
    pub async fn find(
        &self,
        filter: impl Into<BsonDocument>,
        options: Option<FindOptions>,
    ) -> DocumentStoreResult<Vec<T>> {
        let filter = filter.into();

        if let Some(id) = self.routed_identifier(&filter)? {
            let options = options.map(FindOneOptions::from);
            return Ok(self.find_one_by(id, options).await?.into_iter().collect());
        }

        self.collection()
            .await?
            .find(filter, options.unwrap_or_default())
            .await?
            .into_iter()
            .map(T::from_bson_document)
            .collect()
    }

    /// Returns the first document matching `filter`.
    pub async fn find_one(
        &self,
        filter: impl Into<BsonDocument>,
        options: Option<FindOneOptions>,
    ) -> DocumentStoreResult<Option<T>> {
        let filter = filter.into();

        if let Some(id) = self.routed_identifier(&filter)? {
            return self.find_one_by(id, options).await;
        }

        self.collection()
            .await?
            .find_one(filter, options.unwrap_or_default())
            .await?
            .map(T::from_bson_document)
            .transpose()
    }

    /// Returns the document whose `_id` is the 24 character hex string `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidIdentifier`](crate::error::DocumentStoreError::InvalidIdentifier)
    /// without contacting the store if `id` is malformed.
    pub async fn find_by_id(
        &self,
        id: &str,
        options: Option<FindOneOptions>,
    ) -> DocumentStoreResult<Option<T>> {
        let id = to_identifier(id)?;
        self.find_one_by(id, options).await
    }

    async fn find_one_by(
        &self,
        id: ObjectId,
        options: Option<FindOneOptions>,
    ) -> DocumentStoreResult<Option<T>> {
        self.collection()
            .await?
            .find_one(id_filter(id), options.unwrap_or_default())
            .await?
            .map(T::from_bson_document)
            .transpose()
    }

    /// Validates `document` and stores the accepted value.
    ///
    /// The returned document is the validated one. A document without `_id` gets a
    /// fresh `ObjectId` before it is written. Nothing is written when the accepted
    /// document does not convert into `T`.
    pub async fn insert<I: Serialize + ?Sized>(
        &self,
        document: &I,
        options: Option<InsertOneOptions>,
    ) -> DocumentStoreResult<OperationResult<T>> {
        let document = to_input_document(document)?;

        let mut accepted = match validate::validate_full(self.validator(), document) {
            Ok(accepted) => accepted,
            Err(err) => {
                debug!(collection = %self.name, error = %err, "insert rejected");
                return Ok(OperationResult::rejected(err));
            }
        };

        assign_identifier(&mut accepted);
        let inserted = T::from_bson_document(accepted.clone())?;

        self.collection()
            .await?
            .insert_one(accepted, options.unwrap_or_default())
            .await?;

        Ok(OperationResult::ok(Some(inserted)))
    }

    /// Validates every document and stores them all, or none if any is rejected.
    ///
    /// Only the first rejected element is reported. Its index leads the error path.
    pub async fn insert_many<I: Serialize>(
        &self,
        documents: &[I],
        options: Option<InsertManyOptions>,
    ) -> DocumentStoreResult<OperationResult<Vec<T>>> {
        let documents = documents
            .iter()
            .map(to_input_document)
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        let mut accepted = match validate::validate_batch(self.validator(), documents) {
            Ok(accepted) => accepted,
            Err(err) => {
                debug!(collection = %self.name, error = %err, "insert_many rejected");
                return Ok(OperationResult::rejected(err));
            }
        };

        if accepted.is_empty() {
            return Ok(OperationResult::ok(Some(Vec::new())));
        }

        accepted.iter_mut().for_each(assign_identifier);

        let inserted = accepted
            .iter()
            .cloned()
            .map(T::from_bson_document)
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        self.collection()
            .await?
            .insert_many(accepted, options.unwrap_or_default())
            .await?;

        Ok(OperationResult::ok(Some(inserted)))
    }

    /// Validates `patch` partially and merges it into the first document matching `filter`.
    ///
    /// The returned document reflects the state after the update unless
    /// `options.return_document` asks for the previous one. `None` means no match.
    pub async fn update<P: Serialize + ?Sized>(
        &self,
        filter: impl Into<BsonDocument>,
        patch: &P,
        options: Option<UpdateOptions>,
    ) -> DocumentStoreResult<OperationResult<T>> {
        let filter = filter.into();

        match self.routed_identifier(&filter)? {
            Some(id) => self.update_one_by(id_filter(id), patch, options).await,
            None => self.update_one_by(filter, patch, options).await,
        }
    }

    /// Like [`Model::update`], keyed by the 24 character hex string `id`.
    pub async fn update_by_id<P: Serialize + ?Sized>(
        &self,
        id: &str,
        patch: &P,
        options: Option<UpdateOptions>,
    ) -> DocumentStoreResult<OperationResult<T>> {
        let id = to_identifier(id)?;
        self.update_one_by(id_filter(id), patch, options).await
    }

    async fn update_one_by<P: Serialize + ?Sized>(
        &self,
        filter: BsonDocument,
        patch: &P,
        options: Option<UpdateOptions>,
    ) -> DocumentStoreResult<OperationResult<T>> {
        let patch = to_input_document(patch)?;

        let accepted = match validate::validate_partial(self.validator(), patch) {
            Ok(accepted) => accepted,
            Err(err) => {
                debug!(collection = %self.name, error = %err, "update rejected");
                return Ok(OperationResult::rejected(err));
            }
        };

        let updated = self
            .collection()
            .await?
            .find_one_and_update(filter, doc! { "$set": accepted }, options.unwrap_or_default())
            .await?
            .map(T::from_bson_document)
            .transpose()?;

        Ok(OperationResult::ok(updated))
    }

    /// Removes the first document matching `filter` and returns it.
    pub async fn delete(
        &self,
        filter: impl Into<BsonDocument>,
        options: Option<DeleteOptions>,
    ) -> DocumentStoreResult<OperationResult<T>> {
        let filter = filter.into();

        match self.routed_identifier(&filter)? {
            Some(id) => self.delete_one_by(id_filter(id), options).await,
            None => self.delete_one_by(filter, options).await,
        }
    }

    /// Removes the document whose `_id` is the 24 character hex string `id`.
    pub async fn delete_by_id(
        &self,
        id: &str,
        options: Option<DeleteOptions>,
    ) -> DocumentStoreResult<OperationResult<T>> {
        let id = to_identifier(id)?;
        self.delete_one_by(id_filter(id), options).await
    }

    async fn delete_one_by(
        &self,
        filter: BsonDocument,
        options: Option<DeleteOptions>,
    ) -> DocumentStoreResult<OperationResult<T>> {
        let removed = self
            .collection()
            .await?
            .find_one_and_delete(filter, options.unwrap_or_default())
            .await?
            .map(T::from_bson_document)
            .transpose()?;

        Ok(OperationResult::ok(removed))
    }
}

fn id_filter(id: ObjectId) -> BsonDocument {
    let mut filter = BsonDocument::new();
    filter.insert(ID_FIELD, id);
    filter
}

/// Puts a new `ObjectId` first when the document has no `_id`.
fn assign_identifier(document: &mut BsonDocument) {
    if document.contains_key(ID_FIELD) {
        return;
    }

    let mut filled = BsonDocument::new();
    filled.insert(ID_FIELD, ObjectId::new());
    for (key, value) in std::mem::take(document) {
        filled.insert(key, value);
    }
    *document = filled;
}
