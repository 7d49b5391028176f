//! Remote data source port.
//!
//! The backend is an external collaborator reached through the [`DataSource`]
//! trait: filtered, sorted row reads over named collections plus row counts.
//! Rows travel as raw JSON values; typed decoding happens in the application
//! layer.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::types::Collection;

pub mod memory;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("resource not found")]
    NotFound,
    #[error("row decode failed: {0}")]
    Decode(String),
    #[error("backend timeout")]
    Timeout,
}

impl SourceError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    /// Whether the cache coordinator may retry a fetch that failed with this
    /// error. Missing resources and malformed rows do not improve on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Timeout)
    }
}

/// A single condition applied to a select or count.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals the given string value.
    Eq {
        column: &'static str,
        value: String,
    },
    /// Column is one of the given identifiers.
    InUuid {
        column: &'static str,
        ids: Vec<Uuid>,
    },
    /// Case-insensitive substring match against any of the named columns.
    SearchAny {
        columns: Vec<&'static str>,
        term: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

/// A filtered, sorted read over one collection.
#[derive(Debug, Clone)]
pub struct SelectRequest {
    pub collection: Collection,
    /// Columns to project; `None` selects every column.
    pub columns: Option<Vec<&'static str>>,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<u32>,
}

impl SelectRequest {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            columns: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns = Some(columns.to_vec());
        self
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq {
            column,
            value: value.into(),
        });
        self
    }

    pub fn id_in(mut self, column: &'static str, ids: Vec<Uuid>) -> Self {
        self.filters.push(Filter::InUuid { column, ids });
        self
    }

    pub fn search(mut self, columns: &[&'static str], term: impl Into<String>) -> Self {
        self.filters.push(Filter::SearchAny {
            columns: columns.to_vec(),
            term: term.into(),
        });
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Queryable backend exposing row reads and counts over named collections.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn select(&self, request: SelectRequest) -> Result<Vec<Value>, SourceError>;

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_filters_in_order() {
        let request = SelectRequest::new(Collection::Jobs)
            .eq("job_type", "internship")
            .search(&["title", "company"], "rust")
            .order(OrderBy::desc("created_at"))
            .limit(50);

        assert_eq!(request.filters.len(), 2);
        assert!(matches!(request.filters[0], Filter::Eq { column: "job_type", .. }));
        assert!(matches!(request.filters[1], Filter::SearchAny { .. }));
        assert_eq!(request.order, Some(OrderBy::desc("created_at")));
        assert_eq!(request.limit, Some(50));
    }

    #[test]
    fn not_found_and_decode_are_not_retryable() {
        assert!(SourceError::backend("boom").is_retryable());
        assert!(SourceError::Timeout.is_retryable());
        assert!(!SourceError::NotFound.is_retryable());
        assert!(!SourceError::Decode("bad row".into()).is_retryable());
    }
}
