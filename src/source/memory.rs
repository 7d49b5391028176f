//! In-memory data source for tests and local development.
//!
//! Implements the full select/count semantics (equality, IN, OR-substring
//! search, ordering, projection, limit) over plain JSON rows, with injectable
//! failures, per-call latency, and call counters so tests can assert on
//! deduplication and fallback behavior.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::types::Collection;

use super::{DataSource, Filter, OrderBy, SelectRequest, SourceError};

#[derive(Default)]
pub struct MemorySource {
    rows: Mutex<HashMap<Collection, Vec<Value>>>,
    select_calls: Mutex<HashMap<Collection, usize>>,
    count_calls: Mutex<HashMap<Collection, usize>>,
    select_failures: Mutex<HashMap<Collection, usize>>,
    count_failures: Mutex<HashMap<Collection, usize>>,
    select_delay: Mutex<HashMap<Collection, Duration>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, collection: Collection, row: Value) {
        lock(&self.rows).entry(collection).or_default().push(row);
    }

    pub fn extend(&self, collection: Collection, rows: impl IntoIterator<Item = Value>) {
        lock(&self.rows).entry(collection).or_default().extend(rows);
    }

    /// Replace the full row set of a collection, simulating a mutation made
    /// elsewhere in the system.
    pub fn set_rows(&self, collection: Collection, rows: Vec<Value>) {
        lock(&self.rows).insert(collection, rows);
    }

    /// Make the next `failures` selects on `collection` fail with a backend
    /// error.
    pub fn fail_selects(&self, collection: Collection, failures: usize) {
        lock(&self.select_failures).insert(collection, failures);
    }

    /// Make the next `failures` counts on `collection` fail with a backend
    /// error.
    pub fn fail_counts(&self, collection: Collection, failures: usize) {
        lock(&self.count_failures).insert(collection, failures);
    }

    /// Delay every select on `collection`, for ordering-sensitive tests.
    pub fn set_select_delay(&self, collection: Collection, delay: Duration) {
        lock(&self.select_delay).insert(collection, delay);
    }

    pub fn select_calls(&self, collection: Collection) -> usize {
        lock(&self.select_calls).get(&collection).copied().unwrap_or(0)
    }

    pub fn count_calls(&self, collection: Collection) -> usize {
        lock(&self.count_calls).get(&collection).copied().unwrap_or(0)
    }

    fn take_failure(slot: &Mutex<HashMap<Collection, usize>>, collection: Collection) -> bool {
        let mut failures = lock(slot);
        match failures.get_mut(&collection) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn select(&self, request: SelectRequest) -> Result<Vec<Value>, SourceError> {
        *lock(&self.select_calls).entry(request.collection).or_default() += 1;

        let delay = lock(&self.select_delay).get(&request.collection).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if Self::take_failure(&self.select_failures, request.collection) {
            return Err(SourceError::backend("injected select failure"));
        }

        let rows = lock(&self.rows)
            .get(&request.collection)
            .cloned()
            .unwrap_or_default();

        let mut matched: Vec<Value> = rows
            .into_iter()
            .filter(|row| request.filters.iter().all(|filter| matches_filter(row, filter)))
            .collect();

        if let Some(order) = request.order {
            matched.sort_by(|a, b| compare_rows(a, b, order));
        }
        if let Some(limit) = request.limit {
            matched.truncate(limit as usize);
        }

        match &request.columns {
            Some(columns) => Ok(matched.into_iter().map(|row| project(&row, columns)).collect()),
            None => Ok(matched),
        }
    }

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, SourceError> {
        *lock(&self.count_calls).entry(collection).or_default() += 1;

        if Self::take_failure(&self.count_failures, collection) {
            return Err(SourceError::backend("injected count failure"));
        }

        let rows = lock(&self.rows).get(&collection).cloned().unwrap_or_default();
        let matched = rows
            .iter()
            .filter(|row| filters.iter().all(|filter| matches_filter(row, filter)))
            .count();
        Ok(matched as u64)
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { column, value } => row
            .get(*column)
            .and_then(Value::as_str)
            .is_some_and(|cell| cell == value),
        Filter::InUuid { column, ids } => row
            .get(*column)
            .and_then(Value::as_str)
            .and_then(|cell| Uuid::parse_str(cell).ok())
            .is_some_and(|id| ids.contains(&id)),
        Filter::SearchAny { columns, term } => {
            let needle = term.to_lowercase();
            columns.iter().any(|column| {
                row.get(*column)
                    .and_then(Value::as_str)
                    .is_some_and(|cell| cell.to_lowercase().contains(&needle))
            })
        }
    }
}

#[derive(PartialEq, PartialOrd)]
enum SortKey {
    Number(f64),
    Text(String),
}

fn sort_key(row: &Value, column: &str) -> Option<SortKey> {
    match row.get(column) {
        Some(Value::Number(n)) => n.as_f64().map(SortKey::Number),
        Some(Value::String(s)) => Some(SortKey::Text(s.clone())),
        _ => None,
    }
}

fn compare_rows(a: &Value, b: &Value, order: OrderBy) -> Ordering {
    let ordering = match (sort_key(a, order.column), sort_key(b, order.column)) {
        (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        // Rows without a sortable value go last.
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    if order.ascending { ordering } else { ordering.reverse() }
}

fn project(row: &Value, columns: &[&'static str]) -> Value {
    let mut projected = Map::new();
    for column in columns {
        if let Some(value) = row.get(*column) {
            projected.insert((*column).to_string(), value.clone());
        }
    }
    Value::Object(projected)
}
