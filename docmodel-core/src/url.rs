//! Connection string parsing.
//!
//! A connection string has the shape `<scheme>://<authority>/<database>`. The part up to
//! the authority is handed to the driver untouched, the trailing path selects the
//! logical database.

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// A connection string split into the driver endpoint and the logical database name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionUrl {
    /// `<scheme>://<authority>`, plus any `?query` options from the original string.
    pub endpoint: String,
    /// Everything after the first `/` following the authority.
    pub database_name: String,
}

impl ConnectionUrl {
    pub fn parse(url: &str) -> DocumentStoreResult<Self> {
        parse_connection_url(url)
    }
}

impl std::str::FromStr for ConnectionUrl {
    type Err = DocumentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_connection_url(s)
    }
}

/// Splits `url` into endpoint and database name.
///
/// Query options (`?authSource=admin`) are moved onto the endpoint so the driver
/// still sees them.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidUrl`] when the input is empty, has no
/// `scheme://` prefix, has an empty authority, or its database path is missing or
/// has an empty segment.
pub fn parse_connection_url(url: &str) -> DocumentStoreResult<ConnectionUrl> {
    let invalid = || DocumentStoreError::InvalidUrl(url.to_string());

    let url = url.trim();
    let (scheme, rest) = url.split_once("://").ok_or_else(invalid)?;

    if scheme.is_empty() {
        return Err(invalid());
    }

    let (authority, path) = rest.split_once('/').ok_or_else(invalid)?;

    if authority.is_empty() {
        return Err(invalid());
    }

    let (database_name, query) = match path.split_once('?') {
        Some((database_name, query)) => (database_name, Some(query)),
        None => (path, None),
    };

    if database_name.split('/').any(str::is_empty) {
        return Err(invalid());
    }

    let endpoint = match query {
        Some(query) if !query.is_empty() => format!("{scheme}://{authority}/?{query}"),
        _ => format!("{scheme}://{authority}"),
    };

    Ok(ConnectionUrl {
        endpoint,
        database_name: database_name.to_string(),
    })
}
