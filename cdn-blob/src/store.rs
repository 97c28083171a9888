use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::BlobResult;

/// Core object storage operations against one bucket.
///
/// Implementations are long-lived handles shared by every in-flight request;
/// they must be safe for concurrent use and hold no per-request state.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an object under `key`
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        acl: ObjectAcl,
    ) -> BlobResult<PutResult>;

    /// Fetch an object with its content
    async fn get(&self, key: &str) -> BlobResult<GetResult>;

    /// Fetch object metadata without content
    async fn head(&self, key: &str) -> BlobResult<ObjectHead>;

    /// Delete an object
    async fn delete(&self, key: &str) -> BlobResult<()>;

    /// List one page of the bucket, continuing from `continuation` when given
    async fn list_page(&self, continuation: Option<&str>) -> BlobResult<ListPage>;

    /// Bucket this store writes to
    fn bucket(&self) -> &str;
}

/// Canned access control applied on write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectAcl {
    #[default]
    Private,
    PublicRead,
}

impl ObjectAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectAcl::Private => "private",
            ObjectAcl::PublicRead => "public-read",
        }
    }
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub etag: Option<String>,
    pub size_bytes: u64,
}

/// Result of a get operation
#[derive(Debug, Clone)]
pub struct GetResult {
    pub body: Bytes,
    pub head: ObjectHead,
}

/// Metadata about a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectSummary {
    pub fn from_head(key: impl Into<String>, head: &ObjectHead) -> Self {
        Self {
            key: key.into(),
            size: head.size_bytes,
            last_modified: head.last_modified,
        }
    }
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub next_token: Option<String>,
    pub is_truncated: bool,
}
