//! In-memory storage shared by every client of one store.
//!
//! Documents are kept as BSON documents in insertion order, per database and
//! collection, behind async-aware read-write locks. Each collection operation is
//! also appended to an operation log so tests can assert which store calls
//! happened.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};
use bson::{Bson, Document as BsonDocument, oid::ObjectId};
use mea::rwlock::RwLock;
use tracing::trace;

use docmodel_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    identifier::ID_FIELD,
    options::{ReturnDocument, Sort, SortDirection},
    query::{Expr, FieldOp},
};

use crate::evaluator::{DocumentEvaluator, lookup, sort_order};

type CollectionMap = HashMap<String, Vec<BsonDocument>>;
type DatabaseMap = HashMap<String, CollectionMap>;


/// The kind of collection operation recorded in the operation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Find,
    FindOne,
    InsertOne,
    InsertMany,
    FindOneAndUpdate,
    FindOneAndDelete,
}

/// One entry of the operation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOperation {
    pub database: String,
    pub collection: String,
    pub kind: OperationKind,
}

/// Thread-safe in-memory document storage.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses `Arc`-wrapped internal state. Multiple
/// clones of the same instance share the same underlying data, so a store handed
/// to a connection manager through [`InMemoryConfig`](crate::InMemoryConfig) can be
/// inspected by the caller afterwards.
///
/// # Performance
///
/// Every query scans the whole collection. There are no indexes.
///
/// # Example
///
/// ```ignore
/// use docmodel_memory::{InMemoryStore, InMemoryConfig, InMemoryClient};
/// use docmodel::prelude::*;
///
/// let store = InMemoryStore::new();
/// let manager = ConnectionManager::<InMemoryClient>::with_config(InMemoryConfig::new(store.clone()));
/// manager.connect("memory://local/app").await?;
///
/// assert!(store.operations().await.is_empty());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// database name -> collection name -> documents
    databases: Arc<RwLock<DatabaseMap>>,
    operations: Arc<RwLock<Vec<RecordedOperation>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every collection operation issued so far, oldest first.
    pub async fn operations(&self) -> Vec<RecordedOperation> {
        self.operations.read().await.clone()
    }

    /// Forgets the recorded operations. Stored documents are kept.
    pub async fn clear_operations(&self) {
        self.operations.write().await.clear();
    }

    /// Returns a snapshot of a collection in storage order, without recording an operation.
    pub async fn documents(&self, database: &str, collection: &str) -> Vec<BsonDocument> {
        self.databases
            .read()
            .await
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the names of the collections a write has touched, sorted.
    pub async fn list_collections(&self, database: &str) -> Vec<String> {
        let mut names = self
            .databases
            .read()
            .await
            .get(database)
            .map(|collections| collections.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();

        names.sort();
        names
    }

    async fn record(&self, database: &str, collection: &str, kind: OperationKind) {
        trace!(database, collection, ?kind, "in-memory operation");

        self.operations.write().await.push(RecordedOperation {
            database: database.to_string(),
            collection: collection.to_string(),
            kind,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn find(
        &self,
        database: &str,
        collection: &str,
        filter: &BsonDocument,
        sort: &[Sort],
        skip: Option<usize>,
        limit: Option<usize>,
        kind: OperationKind,
    ) -> DocumentStoreResult<Vec<BsonDocument>> {
        self.record(database, collection, kind).await;

        let databases = self.databases.read().await;
        let Some(documents) = databases
            .get(database)
            .and_then(|collections| collections.get(collection))
        else {
            Expr::from_document(filter)?;
            return Ok(vec![]);
        };

        let positions = ordered_matches(documents, filter, sort)?;

        Ok(
            positions
                .into_iter()
                .skip(skip.unwrap_or(0))
                .take(limit.unwrap_or(usize::MAX))
                .map(|position| documents[position].clone())
                .collect()
        )
    }

    pub(crate) async fn insert(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<BsonDocument>,
        kind: OperationKind,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.record(database, collection, kind).await;

        let documents = documents
            .into_iter()
            .map(with_identifier)
            .collect::<Vec<_>>();

        let mut databases = self.databases.write().await;
        let stored = collection_mut(&mut databases, database, collection);

        let mut ids = Vec::with_capacity(documents.len());

        for document in &documents {
            let id = document.get(ID_FIELD).cloned().unwrap_or(Bson::Null);

            if ids.contains(&id) || stored.iter().any(|existing| existing.get(ID_FIELD) == Some(&id)) {
                return Err(duplicate_key(database, collection, &id));
            }

            ids.push(id);
        }

        stored.extend(documents);

        Ok(ids)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn find_one_and_update(
        &self,
        database: &str,
        collection: &str,
        filter: &BsonDocument,
        update: &BsonDocument,
        sort: &[Sort],
        upsert: bool,
        return_document: ReturnDocument,
    ) -> DocumentStoreResult<Option<BsonDocument>> {
        self.record(database, collection, OperationKind::FindOneAndUpdate).await;

        let changes = UpdateSpec::parse(update)?;

        let mut databases = self.databases.write().await;
        let matched = match databases.get(database).and_then(|collections| collections.get(collection)) {
            Some(stored) => ordered_matches(stored, filter, sort)?.first().copied(),
            None => {
                Expr::from_document(filter)?;
                None
            }
        };

        match matched {
            Some(position) => {
                let stored = collection_mut(&mut databases, database, collection);
                let before = stored[position].clone();
                let mut after = before.clone();
                changes.apply(&mut after)?;

                if after.get(ID_FIELD) != before.get(ID_FIELD) {
                    return Err(DocumentStoreError::Backend(
                        "Performing an update on the path '_id' would modify the immutable field '_id'".to_string(),
                    ));
                }

                stored[position] = after.clone();

                Ok(Some(match return_document {
                    ReturnDocument::Before => before,
                    ReturnDocument::After => after,
                }))
            }
            None if upsert => {
                let mut inserted = equality_seed(&Expr::from_document(filter)?);
                changes.apply(&mut inserted)?;
                let inserted = with_identifier(inserted);

                collection_mut(&mut databases, database, collection).push(inserted.clone());

                Ok(match return_document {
                    ReturnDocument::Before => None,
                    ReturnDocument::After => Some(inserted),
                })
            }
            None => Ok(None),
        }
    }

    pub(crate) async fn find_one_and_delete(
        &self,
        database: &str,
        collection: &str,
        filter: &BsonDocument,
        sort: &[Sort],
    ) -> DocumentStoreResult<Option<BsonDocument>> {
        self.record(database, collection, OperationKind::FindOneAndDelete).await;

        let mut databases = self.databases.write().await;
        let Some(stored) = databases
            .get_mut(database)
            .and_then(|collections| collections.get_mut(collection))
        else {
            Expr::from_document(filter)?;
            return Ok(None);
        };

        Ok(
            ordered_matches(stored, filter, sort)?
                .first()
                .map(|&position| stored.remove(position))
        )
    }
}

/// Positions of matching documents, sorted by `sort` (stable, storage order breaks ties).
fn ordered_matches(
    documents: &[BsonDocument],
    filter: &BsonDocument,
    sort: &[Sort],
) -> DocumentStoreResult<Vec<usize>> {
    let mut positions = DocumentEvaluator::matching_positions(documents, filter)?;

    if !sort.is_empty() {
        positions.sort_by(|&a, &b| {
            sort.iter()
                .map(|key| {
                    let ordering = sort_order(
                        lookup(&documents[a], &key.field),
                        lookup(&documents[b], &key.field),
                    );

                    match key.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    Ok(positions)
}

/// Assigns a fresh `ObjectId` as the first field when the document has no `_id`.
/// The documents of `collection`, created on first write.
fn collection_mut<'a>(
    databases: &'a mut DatabaseMap,
    database: &str,
    collection: &str,
) -> &'a mut Vec<BsonDocument> {
    databases
        .entry(database.to_string())
        .or_default()
        .entry(collection.to_string())
        .or_default()
}

fn with_identifier(document: BsonDocument) -> BsonDocument {
    if document.contains_key(ID_FIELD) {
        return document;
    }

    let mut identified = BsonDocument::new();
    identified.insert(ID_FIELD, ObjectId::new());
    for (key, value) in document {
        identified.insert(key, value);
    }

    identified
}

fn duplicate_key(database: &str, collection: &str, id: &Bson) -> DocumentStoreError {
    DocumentStoreError::Backend(format!(
        "E11000 duplicate key error collection: {database}.{collection} index: _id_ dup key: {{ _id: {id} }}"
    ))
}

/// Top-level equality conditions of a filter, used as the base of an upserted document.
fn equality_seed(expr: &Expr) -> BsonDocument {
    let mut seed = BsonDocument::new();

    match expr {
        Expr::Field { field, op: FieldOp::Eq, value } if !field.contains('.') => {
            seed.insert(field.clone(), value.clone());
        }
        Expr::And(exprs) => {
            for expr in exprs {
                for (key, value) in equality_seed(expr) {
                    seed.insert(key, value);
                }
            }
        }
        _ => {}
    }

    seed
}

/// The update operators the in-memory store understands.
#[derive(Debug, Default)]
struct UpdateSpec {
    set: BsonDocument,
    unset: Vec<String>,
}

impl UpdateSpec {
    fn parse(update: &BsonDocument) -> DocumentStoreResult<Self> {
        let mut spec = UpdateSpec::default();

        for (operator, fields) in update {
            let Bson::Document(fields) = fields else {
                return Err(DocumentStoreError::InvalidFilter(format!(
                    "{operator} requires a document"
                )));
            };

            match operator.as_str() {
                "$set" => spec.set = fields.clone(),
                "$unset" => spec.unset = fields.keys().cloned().collect(),
                other => {
                    return Err(DocumentStoreError::InvalidFilter(format!(
                        "unsupported update operator {other}"
                    )));
                }
            }
        }

        Ok(spec)
    }

    fn apply(&self, document: &mut BsonDocument) -> DocumentStoreResult<()> {
        for (path, value) in &self.set {
            set_path(document, path, value.clone())?;
        }

        for path in &self.unset {
            unset_path(document, path);
        }

        Ok(())
    }
}

/// Sets a dotted path, creating intermediate documents as needed.
fn set_path(document: &mut BsonDocument, path: &str, value: Bson) -> DocumentStoreResult<()> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            let child = document
                .entry(head.to_string())
                .or_insert_with(|| Bson::Document(BsonDocument::new()));

            match child {
                Bson::Document(inner) => set_path(inner, rest, value),
                _ => Err(DocumentStoreError::Backend(format!(
                    "Cannot create field '{rest}' in element {{{head}: {child}}}"
                ))),
            }
        }
    }
}

fn unset_path(document: &mut BsonDocument, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                unset_path(inner, rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    const DB: &str = "app";
    const USERS: &str = "users";

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert(
                DB,
                USERS,
                vec![
                    doc! { "name": "Ada", "age": 36 },
                    doc! { "name": "Bob", "age": 17 },
                    doc! { "name": "Cy", "age": 52 },
                ],
                OperationKind::InsertMany,
            )
            .await
            .unwrap();
        store.clear_operations().await;
        store
    }

    #[tokio::test]
    async fn insert_assigns_identifiers_first() {
        let store = InMemoryStore::new();
        let ids = store
            .insert(DB, USERS, vec![doc! { "name": "Ada" }], OperationKind::InsertOne)
            .await
            .unwrap();

        let documents = store.documents(DB, USERS).await;
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].keys().next().map(String::as_str), Some("_id"));
        assert_eq!(documents[0].get(ID_FIELD), Some(&ids[0]));
        assert!(matches!(ids[0], Bson::ObjectId(_)));
    }

    #[tokio::test]
    async fn duplicate_identifiers_are_rejected_without_writing() {
        let store = InMemoryStore::new();
        let id = ObjectId::new();

        store
            .insert(DB, USERS, vec![doc! { "_id": id }], OperationKind::InsertOne)
            .await
            .unwrap();

        let result = store
            .insert(
                DB,
                USERS,
                vec![doc! { "name": "new" }, doc! { "_id": id }],
                OperationKind::InsertMany,
            )
            .await;

        assert!(matches!(result, Err(DocumentStoreError::Backend(_))));
        assert_eq!(store.documents(DB, USERS).await.len(), 1);
    }

    #[tokio::test]
    async fn find_sorts_skips_and_limits() {
        let store = seeded().await;

        let documents = store
            .find(
                DB,
                USERS,
                &doc! { "age": { "$gte": 18 } },
                &[Sort { field: "age".into(), direction: SortDirection::Desc }],
                Some(0),
                Some(1),
                OperationKind::Find,
            )
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].get_str("name").unwrap(), "Cy");
    }

    #[tokio::test]
    async fn find_in_unknown_collection_is_empty() {
        let store = InMemoryStore::new();

        let documents = store
            .find(DB, "missing", &doc! {}, &[], None, None, OperationKind::Find)
            .await
            .unwrap();

        assert!(documents.is_empty());
        assert_eq!(store.operations().await.len(), 1);
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = seeded().await;

        let updated = store
            .find_one_and_update(
                DB,
                USERS,
                &doc! { "name": "Bob" },
                &doc! { "$set": { "age": 18, "address.city": "Oslo" } },
                &[],
                false,
                ReturnDocument::After,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.get_str("name").unwrap(), "Bob");
        assert_eq!(updated.get_i32("age").unwrap(), 18);
        assert_eq!(updated.get_document("address").unwrap(), &doc! { "city": "Oslo" });
    }

    #[tokio::test]
    async fn update_without_match_creates_no_collection() {
        let store = InMemoryStore::new();

        let updated = store
            .find_one_and_update(
                DB,
                USERS,
                &doc! { "name": "Zed" },
                &doc! { "$set": { "age": 1 } },
                &[],
                false,
                ReturnDocument::After,
            )
            .await
            .unwrap();

        assert_eq!(updated, None);
        assert!(store.list_collections(DB).await.is_empty());
    }

    #[tokio::test]
    async fn update_can_return_previous_document() {
        let store = seeded().await;

        let before = store
            .find_one_and_update(
                DB,
                USERS,
                &doc! { "name": "Ada" },
                &doc! { "$unset": { "age": "" } },
                &[],
                false,
                ReturnDocument::Before,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(before.get_i32("age").unwrap(), 36);

        let stored = store.documents(DB, USERS).await;
        assert!(!stored[0].contains_key("age"));
    }

    #[tokio::test]
    async fn upsert_inserts_from_filter_equalities() {
        let store = InMemoryStore::new();

        let inserted = store
            .find_one_and_update(
                DB,
                USERS,
                &doc! { "name": "Dee", "age": { "$gt": 3 } },
                &doc! { "$set": { "active": true } },
                &[],
                true,
                ReturnDocument::After,
            )
            .await
            .unwrap()
            .unwrap();

        assert!(inserted.get_object_id(ID_FIELD).is_ok());
        assert_eq!(inserted.get_str("name").unwrap(), "Dee");
        assert!(!inserted.contains_key("age"));
        assert!(inserted.get_bool("active").unwrap());
    }

    #[tokio::test]
    async fn unsupported_update_operators_are_rejected() {
        let store = seeded().await;

        let result = store
            .find_one_and_update(
                DB,
                USERS,
                &doc! {},
                &doc! { "$inc": { "age": 1 } },
                &[],
                false,
                ReturnDocument::After,
            )
            .await;

        assert!(matches!(result, Err(DocumentStoreError::InvalidFilter(_))));
    }

    #[tokio::test]
    async fn identifiers_are_immutable() {
        let store = seeded().await;

        let result = store
            .find_one_and_update(
                DB,
                USERS,
                &doc! { "name": "Ada" },
                &doc! { "$set": { "_id": ObjectId::new() } },
                &[],
                false,
                ReturnDocument::After,
            )
            .await;

        assert!(matches!(result, Err(DocumentStoreError::Backend(_))));
    }

    #[tokio::test]
    async fn delete_removes_first_match_in_sort_order() {
        let store = seeded().await;

        let removed = store
            .find_one_and_delete(
                DB,
                USERS,
                &doc! {},
                &[Sort { field: "age".into(), direction: SortDirection::Asc }],
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(removed.get_str("name").unwrap(), "Bob");
        assert_eq!(store.documents(DB, USERS).await.len(), 2);
        assert_eq!(
            store.operations().await,
            vec![RecordedOperation {
                database: DB.into(),
                collection: USERS.into(),
                kind: OperationKind::FindOneAndDelete,
            }]
        );
    }
}
