//! Per-call options passed through the model to the store driver.
//!
//! Every model operation takes an optional options value. The model never reads
//! them, it hands them to the driver, which maps them onto its native options.
//!
//! ```ignore
//! use docmodel::options::{FindOptions, SortDirection};
//!
//! let options = FindOptions::new()
//!     .sort("created_at", SortDirection::Desc)
//!     .skip(20)
//!     .limit(10);
//! ```

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortDirection {
    /// The numeric form used in driver sort documents.
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// One sort key. Keys are applied in the order they were added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Whether `find_one_and_update` style calls return the document before or after the change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnDocument {
    Before,
    #[default]
    After,
}

/// Options for `find`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Number of documents to skip.
    pub skip: Option<usize>,
    /// Sort keys for results.
    pub sort: Vec<Sort>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(Sort { field: field.into(), direction });
        self
    }
}

/// Options for `find_one` and `find_by_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOneOptions {
    pub skip: Option<usize>,
    pub sort: Vec<Sort>,
}

impl FindOneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(Sort { field: field.into(), direction });
        self
    }
}

/// A `find` that was routed to an identifier lookup keeps its sort and skip.
impl From<FindOptions> for FindOneOptions {
    fn from(options: FindOptions) -> Self {
        Self {
            skip: options.skip,
            sort: options.sort,
        }
    }
}

/// Options for `insert`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOneOptions {
    /// Skip server-side document validation, where the driver supports it.
    pub bypass_document_validation: Option<bool>,
}

impl InsertOneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bypass_document_validation(mut self, bypass: bool) -> Self {
        self.bypass_document_validation = Some(bypass);
        self
    }
}

/// Options for `insert_many`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertManyOptions {
    /// Stop at the first failed write (driver default) or keep going.
    pub ordered: Option<bool>,
    pub bypass_document_validation: Option<bool>,
}

impl InsertManyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = Some(ordered);
        self
    }

    pub fn bypass_document_validation(mut self, bypass: bool) -> Self {
        self.bypass_document_validation = Some(bypass);
        self
    }
}

/// Options for `update` and `update_by_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert a new document when nothing matches the filter.
    pub upsert: Option<bool>,
    /// Which version of the document to return. Defaults to [`ReturnDocument::After`].
    pub return_document: ReturnDocument,
    /// Picks which document is updated when several match.
    pub sort: Vec<Sort>,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }

    pub fn return_document(mut self, return_document: ReturnDocument) -> Self {
        self.return_document = return_document;
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(Sort { field: field.into(), direction });
        self
    }
}

/// Options for `delete` and `delete_by_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Picks which document is removed when several match.
    pub sort: Vec<Sort>,
}

impl DeleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(Sort { field: field.into(), direction });
        self
    }
}
