//! Row-level access to the hosted data store.
//!
//! Rows travel as JSON objects; typed decoding happens in the repository.

use std::future::Future;

use appdesk_core::types::Table;
use appdesk_core::AppDeskResult;
use serde_json::Value;
use uuid::Uuid;

use crate::query::Query;

/// Select / insert / update / delete over the store's tables.
///
/// Failures are returned as-is; nothing here retries.
pub trait DataStore: Send + Sync {
    fn select(&self, table: Table, query: &Query) -> impl Future<Output = AppDeskResult<Vec<Value>>> + Send;

    /// Insert one row and return it as stored.
    fn insert(&self, table: Table, row: Value) -> impl Future<Output = AppDeskResult<Value>> + Send;

    /// Merge `patch` into the row with `id`. `NotFound` when no row matches.
    fn update(&self, table: Table, id: Uuid, patch: Value) -> impl Future<Output = AppDeskResult<Value>> + Send;

    /// Delete the row with `id`. Deleting a missing row succeeds.
    fn delete(&self, table: Table, id: Uuid) -> impl Future<Output = AppDeskResult<()>> + Send;
}
