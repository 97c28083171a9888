use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{DocResult, FieldUpdate};

/// Document storage with partial, field-targeted writes.
///
/// Collections are flat; documents are JSON objects addressed by id.
/// Handles are shared across requests and must be safe for concurrent use.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document; fails with `AlreadyExists` if the id is taken
    async fn create(&self, collection: &str, id: &str, doc: Value) -> DocResult<WriteResult>;

    /// Fetch a document; fails with `NotFound` if absent
    async fn get(&self, collection: &str, id: &str) -> DocResult<Snapshot>;

    /// Apply field updates to an existing document in one write
    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> DocResult<WriteResult>;

    /// Delete a document
    async fn delete(&self, collection: &str, id: &str) -> DocResult<()>;

    /// Documents whose `field` equals any of `values`
    async fn query_where_in(
        &self,
        collection: &str,
        field: &str,
        values: &[Value],
    ) -> DocResult<Vec<Snapshot>>;

    /// Every document in a collection
    async fn list(&self, collection: &str) -> DocResult<Vec<Snapshot>>;

    /// Whether a document exists, built on `get`
    async fn exists(&self, collection: &str, id: &str) -> DocResult<bool> {
        match self.get(collection, id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Outcome of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub update_time: DateTime<Utc>,
}

/// A document as read from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub data: Value,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Snapshot {
    /// Decode the document body into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> DocResult<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Read a single (possibly dotted) field
    pub fn field(&self, path: &str) -> Option<&Value> {
        crate::update::field_at(&self.data, path)
    }
}
