//! In-memory data store backed by DashMap.
//!
//! Same filter and ordering semantics as the hosted store, for development
//! and tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use appdesk_core::types::Table;
use appdesk_core::{AppDeskError, AppDeskResult};
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::query::Query;
use crate::store::DataStore;

#[derive(Default)]
pub struct InMemoryDataStore {
    tables: DashMap<Table, Vec<Value>>,
    selects: AtomicUsize,
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows without the duplicate-id check.
    pub fn seed(&self, table: Table, rows: impl IntoIterator<Item = Value>) {
        self.tables.entry(table).or_default().extend(rows);
    }

    /// Number of `select` calls served so far.
    pub fn select_count(&self) -> usize {
        self.selects.load(Ordering::Relaxed)
    }

    pub fn row_count(&self, table: Table) -> usize {
        self.tables.get(&table).map(|rows| rows.len()).unwrap_or(0)
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

impl DataStore for InMemoryDataStore {
    async fn select(&self, table: Table, query: &Query) -> AppDeskResult<Vec<Value>> {
        self.selects.fetch_add(1, Ordering::Relaxed);
        let rows = self.tables.get(&table).map(|rows| rows.value().clone()).unwrap_or_default();
        Ok(query.apply(rows))
    }

    async fn insert(&self, table: Table, mut row: Value) -> AppDeskResult<Value> {
        let Some(fields) = row.as_object_mut() else {
            return Err(AppDeskError::DataStore {
                status: 400,
                message: format!("{table}: row must be a JSON object"),
            });
        };
        if !fields.get("id").is_some_and(Value::is_string) {
            fields.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }

        let mut rows = self.tables.entry(table).or_default();
        if rows.iter().any(|r| row_id(r) == row_id(&row)) {
            return Err(AppDeskError::DataStore {
                status: 409,
                message: format!("{table}: duplicate key value violates unique constraint on id"),
            });
        }
        rows.push(row.clone());
        debug!(table = %table, "Row inserted");
        Ok(row)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> AppDeskResult<Value> {
        let Value::Object(patch) = patch else {
            return Err(AppDeskError::DataStore {
                status: 400,
                message: format!("{table}: patch must be a JSON object"),
            });
        };
        let id_text = id.to_string();

        let mut rows = self.tables.entry(table).or_default();
        let row = rows
            .iter_mut()
            .find(|r| row_id(r) == Some(id_text.as_str()))
            .ok_or_else(|| AppDeskError::not_found(table.as_str(), id))?;
        if let Some(fields) = row.as_object_mut() {
            for (key, value) in patch {
                if key != "id" {
                    fields.insert(key, value);
                }
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: Table, id: Uuid) -> AppDeskResult<()> {
        let id_text = id.to_string();
        if let Some(mut rows) = self.tables.get_mut(&table) {
            rows.retain(|r| row_id(r) != Some(id_text.as_str()));
        }
        Ok(())
    }
}
