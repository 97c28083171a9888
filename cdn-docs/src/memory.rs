use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::update::{apply_update, field_at};
use crate::{DocError, DocResult, DocumentStore, FieldUpdate, Snapshot, WriteResult};

/// Largest `in` list a single membership query may carry.
pub const MAX_IN_VALUES: usize = 30;

/// Operation selector for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocOp {
    Create,
    Get,
    Update,
    Delete,
    /// Counted once per `in` chunk sent
    Query,
    List,
}

#[derive(Debug, Clone)]
struct StoredDoc {
    data: Value,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

impl StoredDoc {
    fn snapshot(&self, id: &str) -> Snapshot {
        Snapshot {
            id: id.to_string(),
            data: self.data.clone(),
            create_time: self.create_time,
            update_time: self.update_time,
        }
    }
}

type Collection = BTreeMap<String, StoredDoc>;

/// In-process document store.
///
/// Collections are created on first write; documents list in id order.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    failing: RwLock<HashSet<DocOp>>,
    calls: RwLock<HashMap<DocOp, usize>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` fail with a backend error.
    pub fn fail_on(&self, op: DocOp) {
        self.failing.write().insert(op);
    }

    /// Undo [`fail_on`](Self::fail_on) for `op`.
    pub fn recover(&self, op: DocOp) {
        self.failing.write().remove(&op);
    }

    pub fn calls(&self, op: DocOp) -> usize {
        self.calls.read().get(&op).copied().unwrap_or(0)
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    fn enter(&self, op: DocOp) -> DocResult<()> {
        *self.calls.write().entry(op).or_insert(0) += 1;

        if self.failing.read().contains(&op) {
            return Err(DocError::backend(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("injected {:?} failure", op),
            )));
        }
        Ok(())
    }

    /// Write timestamps never go backwards for a document, even when the
    /// clock reads the same instant twice.
    fn next_time(previous: DateTime<Utc>) -> DateTime<Utc> {
        let now = Utc::now();
        if now > previous {
            now
        } else {
            previous + chrono::Duration::microseconds(1)
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, id: &str, doc: Value) -> DocResult<WriteResult> {
        self.enter(DocOp::Create)?;

        if id.is_empty() {
            return Err(DocError::invalid("document id must not be empty"));
        }
        if !doc.is_object() {
            return Err(DocError::invalid("document body must be an object"));
        }

        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(DocError::already_exists(collection, id));
        }

        let now = Utc::now();
        docs.insert(
            id.to_string(),
            StoredDoc {
                data: doc,
                create_time: now,
                update_time: now,
            },
        );
        debug!(collection, id, "document created");

        Ok(WriteResult { update_time: now })
    }

    async fn get(&self, collection: &str, id: &str) -> DocResult<Snapshot> {
        self.enter(DocOp::Get)?;

        self.collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|doc| doc.snapshot(id))
            .ok_or_else(|| DocError::not_found(collection, id))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> DocResult<WriteResult> {
        self.enter(DocOp::Update)?;

        let mut collections = self.collections.write();
        let stored = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| DocError::not_found(collection, id))?;

        // all or nothing: apply to a copy, then swap in
        let mut data = stored.data.clone();
        for update in updates {
            apply_update(&mut data, update)?;
        }

        stored.data = data;
        stored.update_time = Self::next_time(stored.update_time);
        debug!(collection, id, fields = updates.len(), "document updated");

        Ok(WriteResult {
            update_time: stored.update_time,
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> DocResult<()> {
        self.enter(DocOp::Delete)?;

        if let Some(docs) = self.collections.write().get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    #[instrument(skip(self, values), fields(values = values.len()))]
    async fn query_where_in(
        &self,
        collection: &str,
        field: &str,
        values: &[Value],
    ) -> DocResult<Vec<Snapshot>> {
        crate::update::split_path(field)?;

        let mut found: BTreeMap<String, Snapshot> = BTreeMap::new();
        for chunk in values.chunks(MAX_IN_VALUES) {
            self.enter(DocOp::Query)?;

            let collections = self.collections.read();
            let Some(docs) = collections.get(collection) else {
                continue;
            };
            for (id, doc) in docs {
                let matches = field_at(&doc.data, field)
                    .map(|v| chunk.contains(v))
                    .unwrap_or(false);
                if matches {
                    found.entry(id.clone()).or_insert_with(|| doc.snapshot(id));
                }
            }
        }

        Ok(found.into_values().collect())
    }

    async fn list(&self, collection: &str) -> DocResult<Vec<Snapshot>> {
        self.enter(DocOp::List)?;

        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|docs| docs.iter().map(|(id, doc)| doc.snapshot(id)).collect())
            .unwrap_or_default())
    }
}
