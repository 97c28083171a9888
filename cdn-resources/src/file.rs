//! Stored files: one blob plus one metadata document.
//!
//! Upload writes the blob first and the document second; delete runs in the
//! same order. Neither pair is transactional. A failure in the second step
//! surfaces as `PartialFailure` and leaves the first step in place.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use cdn_blob::{file_extension, object_key, sniff_content_type, BlobStore, ObjectAcl};
use cdn_core::{bail_cdn, CdnConfig, CdnError, CdnResult, IdSource, OwnerId, RandomIds};
use cdn_docs::{DocumentStore, Snapshot};

/// Metadata of a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub id: String,
    /// Extension of the uploaded filename, dot included; may be empty
    pub ext: String,
    pub owner: OwnerId,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Object key of the blob holding this file's bytes
    pub fn key(&self) -> String {
        object_key(&self.id, &self.ext)
    }

    pub(crate) fn from_snapshot(snapshot: &Snapshot) -> CdnResult<Self> {
        let doc: FileDoc = snapshot.decode()?;
        Ok(Self {
            id: doc.id,
            ext: doc.ext,
            owner: doc.owner,
            size: doc.size,
            created_at: snapshot.create_time,
            updated_at: snapshot.update_time,
        })
    }
}

/// Persisted body of a file document.
#[derive(Debug, Serialize, Deserialize)]
struct FileDoc {
    id: String,
    #[serde(default)]
    ext: String,
    owner: OwnerId,
    size: u64,
}

/// Pick an id no existing document uses, probing up to `attempts` candidates.
pub(crate) async fn allocate_id(
    docs: &dyn DocumentStore,
    ids: &dyn IdSource,
    collection: &str,
    attempts: usize,
) -> CdnResult<String> {
    for attempt in 1..=attempts.max(1) {
        let candidate = ids.next_id();
        if !docs.exists(collection, &candidate).await? {
            return Ok(candidate);
        }
        debug!(collection, attempt, "id collision, drawing another");
    }
    Err(CdnError::conflict(format!(
        "Could not allocate a unique id after {} attempts",
        attempts.max(1)
    )))
}

/// Files over a blob store and a document store.
#[derive(Clone)]
pub struct FileResource {
    blobs: Arc<dyn BlobStore>,
    docs: Arc<dyn DocumentStore>,
    ids: Arc<dyn IdSource>,
    config: Arc<CdnConfig>,
}

impl FileResource {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        docs: Arc<dyn DocumentStore>,
        config: Arc<CdnConfig>,
    ) -> Self {
        let ids = Arc::new(RandomIds::new(config.id_length));
        Self {
            blobs,
            docs,
            ids,
            config,
        }
    }

    /// Replace the id source
    pub fn with_ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    fn collection(&self) -> &str {
        &self.config.files_collection
    }

    /// Store `bytes` for `owner` and record its metadata.
    ///
    /// The content type is sniffed from the bytes; `original_filename` only
    /// contributes the extension.
    #[instrument(skip(self, owner, bytes), fields(owner = %owner, size = bytes.len()))]
    pub async fn upload(
        &self,
        owner: &OwnerId,
        bytes: Bytes,
        original_filename: &str,
    ) -> CdnResult<FileRecord> {
        if bytes.is_empty() {
            bail_cdn!(validation, "Uploaded file is empty.");
        }

        let content_type = sniff_content_type(&bytes);
        let ext = file_extension(original_filename).to_string();
        let size = bytes.len() as u64;

        let id = allocate_id(
            self.docs.as_ref(),
            self.ids.as_ref(),
            self.collection(),
            self.config.id_attempts,
        )
        .await?;
        let key = object_key(&id, &ext);

        self.blobs
            .put(&key, bytes, content_type, ObjectAcl::PublicRead)
            .await?;

        let doc = FileDoc {
            id: id.clone(),
            ext: ext.clone(),
            owner: owner.clone(),
            size,
        };
        let body = serde_json::to_value(&doc).map_err(CdnError::store)?;

        match self.docs.create(self.collection(), &id, body).await {
            Ok(written) => {
                info!(id = %id, key = %key, content_type, "file uploaded");
                Ok(FileRecord {
                    id,
                    ext,
                    owner: owner.clone(),
                    size,
                    created_at: written.update_time,
                    updated_at: written.update_time,
                })
            }
            Err(e) => {
                warn!(key = %key, bucket = self.blobs.bucket(), error = %e, "file metadata write failed, blob left orphaned");
                Err(CdnError::partial("File metadata write failed", e.into()))
            }
        }
    }

    /// Fetch a file's metadata
    pub async fn resolve(&self, id: &str) -> CdnResult<FileRecord> {
        match self.docs.get(self.collection(), id).await {
            Ok(snapshot) => FileRecord::from_snapshot(&snapshot),
            Err(e) if e.is_not_found() => Err(CdnError::not_found("File not found")),
            Err(e) => Err(e.into()),
        }
    }

    /// Fails with `Forbidden` unless `caller` owns the file
    pub fn check_owner(&self, record: &FileRecord, caller: &OwnerId) -> CdnResult<()> {
        if &record.owner != caller {
            return Err(CdnError::forbidden("Cannot modify file not owned."));
        }
        Ok(())
    }

    /// Remove the blob, then the metadata.
    ///
    /// If the blob delete fails the metadata is left untouched.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn delete(&self, record: &FileRecord) -> CdnResult<()> {
        let key = record.key();
        self.blobs.delete(&key).await?;

        if let Err(e) = self.docs.delete(self.collection(), &record.id).await {
            warn!(id = %record.id, error = %e, "blob deleted but file metadata delete failed");
            return Err(CdnError::partial("File metadata delete failed", e.into()));
        }

        info!(id = %record.id, key = %key, "file deleted");
        Ok(())
    }

    /// Delete several files of one owner.
    ///
    /// Every id is resolved and owner-checked before anything is deleted.
    pub async fn delete_many<S>(&self, caller: &OwnerId, ids: &[S]) -> CdnResult<Vec<FileRecord>>
    where
        S: AsRef<str> + Sync,
    {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self.resolve(id.as_ref()).await?;
            self.check_owner(&record, caller)?;
            records.push(record);
        }

        for record in &records {
            self.delete(record).await?;
        }
        Ok(records)
    }

    /// Public URL through the CDN endpoint
    pub fn cdn_url(&self, record: &FileRecord) -> String {
        format!("{}/{}", self.config.cdn_endpoint, record.key())
    }

    /// Direct URL into the storage bucket
    pub fn storage_url(&self, record: &FileRecord) -> String {
        format!("{}/{}", self.config.spaces.url, record.key())
    }
}
