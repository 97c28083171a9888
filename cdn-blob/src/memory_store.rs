use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    BlobError, BlobResult, BlobStore, GetResult, ListPage, ObjectAcl, ObjectHead, ObjectSummary,
    PutResult,
};

/// Default number of objects returned per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Operation selector for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOp {
    Put,
    Get,
    Head,
    Delete,
    List,
}

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: String,
    acl: ObjectAcl,
    last_modified: DateTime<Utc>,
}

impl StoredObject {
    fn head(&self, key: &str) -> ObjectHead {
        ObjectHead {
            size_bytes: self.body.len() as u64,
            content_type: Some(self.content_type.clone()),
            etag: Some(format!("\"{}-{}\"", key, self.body.len())),
            last_modified: Some(self.last_modified),
        }
    }
}

/// In-process blob store.
///
/// Objects are kept in key order so listing pages are stable. Listing
/// tokens are the last key of the previous page.
pub struct MemoryBlobStore {
    bucket: String,
    page_size: usize,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    failing: RwLock<HashSet<BlobOp>>,
    calls: RwLock<HashMap<BlobOp, usize>>,
}

impl MemoryBlobStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            page_size: DEFAULT_PAGE_SIZE,
            objects: RwLock::new(BTreeMap::new()),
            failing: RwLock::new(HashSet::new()),
            calls: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every subsequent `op` fail with a backend error.
    pub fn fail_on(&self, op: BlobOp) {
        self.failing.write().insert(op);
    }

    /// Undo [`fail_on`](Self::fail_on) for `op`.
    pub fn recover(&self, op: BlobOp) {
        self.failing.write().remove(&op);
    }

    /// Number of times `op` has been invoked, failed calls included.
    pub fn calls(&self, op: BlobOp) -> usize {
        self.calls.read().get(&op).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Access control the object was written with.
    pub fn acl_of(&self, key: &str) -> Option<ObjectAcl> {
        self.objects.read().get(key).map(|o| o.acl)
    }

    fn enter(&self, op: BlobOp) -> BlobResult<()> {
        *self.calls.write().entry(op).or_insert(0) += 1;

        if self.failing.read().contains(&op) {
            return Err(BlobError::backend(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("injected {:?} failure", op),
            )));
        }
        Ok(())
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        acl: ObjectAcl,
    ) -> BlobResult<PutResult> {
        self.enter(BlobOp::Put)?;

        if key.is_empty() {
            return Err(BlobError::invalid("object key must not be empty"));
        }

        let size_bytes = body.len() as u64;
        let object = StoredObject {
            body,
            content_type: content_type.to_string(),
            acl,
            last_modified: Utc::now(),
        };
        let etag = object.head(key).etag;

        self.objects.write().insert(key.to_string(), object);
        debug!(bucket = %self.bucket, key, size_bytes, "object stored");

        Ok(PutResult { etag, size_bytes })
    }

    async fn get(&self, key: &str) -> BlobResult<GetResult> {
        self.enter(BlobOp::Get)?;

        let objects = self.objects.read();
        let object = objects.get(key).ok_or_else(|| BlobError::not_found(key))?;

        Ok(GetResult {
            body: object.body.clone(),
            head: object.head(key),
        })
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        self.enter(BlobOp::Head)?;

        self.objects
            .read()
            .get(key)
            .map(|o| o.head(key))
            .ok_or_else(|| BlobError::not_found(key))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.enter(BlobOp::Delete)?;

        // deleting an absent key succeeds, as on S3
        self.objects.write().remove(key);
        Ok(())
    }

    async fn list_page(&self, continuation: Option<&str>) -> BlobResult<ListPage> {
        self.enter(BlobOp::List)?;

        let objects = self.objects.read();
        let lower = match continuation {
            Some(token) => Bound::Excluded(token.to_string()),
            None => Bound::Unbounded,
        };

        let mut range = objects.range((lower, Bound::Unbounded));
        let page: Vec<ObjectSummary> = range
            .by_ref()
            .take(self.page_size)
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: object.body.len() as u64,
                last_modified: Some(object.last_modified),
            })
            .collect();

        let is_truncated = range.next().is_some();
        let next_token = if is_truncated {
            page.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects: page,
            next_token,
            is_truncated,
        })
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(keys: &[&str], page_size: usize) -> MemoryBlobStore {
        let store = MemoryBlobStore::new("test").with_page_size(page_size);
        for key in keys {
            store
                .put(key, Bytes::from_static(b"data"), "text/plain", ObjectAcl::Private)
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn put_then_head_and_get() {
        let store = MemoryBlobStore::default();
        let result = store
            .put("a.png", Bytes::from_static(b"0123456789"), "image/png", ObjectAcl::PublicRead)
            .await
            .unwrap();
        assert_eq!(result.size_bytes, 10);

        let head = store.head("a.png").await.unwrap();
        assert_eq!(head.size_bytes, 10);
        assert_eq!(head.content_type.as_deref(), Some("image/png"));
        assert_eq!(store.acl_of("a.png"), Some(ObjectAcl::PublicRead));

        let got = store.get("a.png").await.unwrap();
        assert_eq!(&got.body[..], b"0123456789");
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let store = MemoryBlobStore::default();
        assert!(store.head("nope").await.unwrap_err().is_not_found());
        assert!(store.get("nope").await.unwrap_err().is_not_found());
        tokio_test::assert_ok!(store.delete("nope").await);
    }

    #[tokio::test]
    async fn pages_follow_key_order() {
        let store = seeded(&["c", "a", "b"], 2).await;

        let first = store.list_page(None).await.unwrap();
        let keys: Vec<_> = first.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(first.is_truncated);
        assert_eq!(first.next_token.as_deref(), Some("b"));

        let second = store.list_page(first.next_token.as_deref()).await.unwrap();
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.objects[0].key, "c");
        assert!(!second.is_truncated);
        assert!(second.next_token.is_none());
    }

    #[tokio::test]
    async fn exact_page_is_not_truncated() {
        let store = seeded(&["a", "b"], 2).await;
        let page = store.list_page(None).await.unwrap();
        assert_eq!(page.objects.len(), 2);
        assert!(!page.is_truncated);
    }

    #[tokio::test]
    async fn injected_failures_and_counts() {
        let store = MemoryBlobStore::default();
        store.fail_on(BlobOp::Put);

        let err = store
            .put("k", Bytes::from_static(b"x"), "text/plain", ObjectAcl::Private)
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::Backend { .. }));
        assert!(!store.contains("k"));
        assert_eq!(store.calls(BlobOp::Put), 1);

        store.recover(BlobOp::Put);
        store
            .put("k", Bytes::from_static(b"x"), "text/plain", ObjectAcl::Private)
            .await
            .unwrap();
        assert_eq!(store.calls(BlobOp::Put), 2);
        assert_eq!(store.len(), 1);
    }
}
