//! Data access for the AppDesk back office.
//!
//! [`DataStore`] is the row-level seam to the hosted store, with an HTTP
//! implementation ([`RestDataStore`]) and an in-memory one
//! ([`InMemoryDataStore`]). [`Repository`] layers typed, cached reads,
//! validated form writes, joined list rows, and the dashboard on top.

pub mod forms;
pub mod memory;
pub mod query;
pub mod repository;
pub mod rest;
pub mod rows;
pub mod store;

pub use memory::InMemoryDataStore;
pub use query::Query;
pub use repository::{CachedEntity, Repository};
pub use rest::RestDataStore;
pub use store::DataStore;
