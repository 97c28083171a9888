//! Entry points for the routing layer.
//!
//! Every method returns `CdnResult<T>`; routes turn an error into the
//! uniform payload with `Failure::from(&err)`.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cdn_blob::{list_all_objects, list_by_keys, BlobStore};
use cdn_core::{bearer_token, CdnConfig, CdnError, CdnResult, IdSource, IdentityVerifier, OwnerId};
use cdn_docs::DocumentStore;

use crate::embed::Embed;
use crate::file::{FileRecord, FileResource};
use crate::folder::{FolderRecord, FolderResource, FolderSummary};
use crate::links::FileLinks;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub url: String,
    pub file: FileRecord,
}

/// Requested changes to a folder. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FolderPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

/// The resource layer behind one configuration.
#[derive(Clone)]
pub struct CdnService {
    config: Arc<CdnConfig>,
    verifier: Arc<dyn IdentityVerifier>,
    blobs: Arc<dyn BlobStore>,
    files: FileResource,
    folders: FolderResource,
}

impl CdnService {
    pub fn new(
        config: CdnConfig,
        verifier: Arc<dyn IdentityVerifier>,
        blobs: Arc<dyn BlobStore>,
        docs: Arc<dyn DocumentStore>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            files: FileResource::new(blobs.clone(), docs.clone(), config.clone()),
            folders: FolderResource::new(docs, config.clone()),
            config,
            verifier,
            blobs,
        }
    }

    /// Use `ids` for both files and folders
    pub fn with_ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.files = self.files.with_ids(ids.clone());
        self.folders = self.folders.with_ids(ids);
        self
    }

    pub fn config(&self) -> &CdnConfig {
        &self.config
    }

    pub fn files(&self) -> &FileResource {
        &self.files
    }

    pub fn folders(&self) -> &FolderResource {
        &self.folders
    }

    /// Resolve an `Authorization` header value to the caller's owner id
    pub async fn authenticate(&self, authorization: &str) -> CdnResult<OwnerId> {
        let token = bearer_token(authorization)
            .ok_or_else(|| CdnError::not_authenticated("No authorization token provided."))?;
        self.verifier.verify(token).await
    }

    pub async fn upload(
        &self,
        owner: &OwnerId,
        bytes: Bytes,
        original_filename: &str,
    ) -> CdnResult<UploadReceipt> {
        let file = self.files.upload(owner, bytes, original_filename).await?;
        Ok(UploadReceipt {
            url: self.files.cdn_url(&file),
            file,
        })
    }

    pub async fn resolve_file(&self, id: &str) -> CdnResult<FileRecord> {
        self.files.resolve(id).await
    }

    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn delete_file(&self, owner: &OwnerId, id: &str) -> CdnResult<FileRecord> {
        let file = self.files.resolve(id).await?;
        self.files.check_owner(&file, owner)?;
        self.files.delete(&file).await?;
        Ok(file)
    }

    pub async fn create_folder(&self, owner: &OwnerId, name: &str) -> CdnResult<FolderRecord> {
        let folder = self.folders.create(name, owner).await?;
        Ok(folder.record().clone())
    }

    pub async fn resolve_folder(&self, id: &str) -> CdnResult<FolderRecord> {
        let folder = self.folders.resolve(id, false).await?;
        Ok(folder.record().clone())
    }

    /// Apply a patch and save once, only if it changed anything.
    #[instrument(skip(self, owner, patch), fields(owner = %owner))]
    pub async fn patch_folder(
        &self,
        owner: &OwnerId,
        id: &str,
        patch: FolderPatch,
    ) -> CdnResult<FolderRecord> {
        let mut folder = self.folders.resolve(id, false).await?;
        folder.check_owner(owner)?;

        if let Some(name) = &patch.name {
            folder.set_name(name)?;
        }
        if !patch.add.is_empty() {
            folder.add_files(patch.add.as_slice(), false).await?;
        }
        if !patch.remove.is_empty() {
            folder.remove_files(patch.remove.as_slice());
        }

        if folder.is_changed() {
            folder.save().await?;
        }
        Ok(folder.record().clone())
    }

    /// Delete a folder; with `cascade` the caller's member files go too.
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn delete_folder(
        &self,
        owner: &OwnerId,
        id: &str,
        cascade: bool,
    ) -> CdnResult<FolderRecord> {
        let folder = self.folders.resolve(id, false).await?;
        folder.check_owner(owner)?;

        if cascade {
            folder.delete_with_files(&self.files, owner).await?;
        } else {
            folder.delete().await?;
        }
        Ok(folder.record().clone())
    }

    pub async fn list_folders(&self, owner: &OwnerId) -> CdnResult<Vec<FolderSummary>> {
        self.folders.list_for_owner(owner).await
    }

    /// Links for every object in the bucket.
    pub async fn list_all(&self) -> CdnResult<Vec<FileLinks>> {
        let summaries: Vec<_> = list_all_objects(self.blobs.as_ref()).try_collect().await?;
        Ok(summaries
            .iter()
            .map(|s| FileLinks::from_summary(&self.config, s))
            .collect())
    }

    /// Links for the given object keys, in the order given.
    pub async fn list_by_keys(&self, keys: &[String]) -> CdnResult<Vec<FileLinks>> {
        let summaries = list_by_keys(self.blobs.as_ref(), keys).await?;
        Ok(summaries
            .iter()
            .map(|s| FileLinks::from_summary(&self.config, s))
            .collect())
    }

    /// Links for every member file of a folder that still has metadata.
    pub async fn folder_links(&self, id: &str) -> CdnResult<Vec<FileLinks>> {
        let folder = self.folders.resolve(id, true).await?;
        let keys: Vec<String> = folder.cached_files().iter().map(FileRecord::key).collect();
        self.list_by_keys(&keys).await
    }

    /// Preview metadata for the object under `key`.
    pub async fn embed_for(&self, key: &str) -> CdnResult<Embed> {
        let head = self.blobs.head(key).await?;
        Ok(Embed::from_head(&head))
    }
}
