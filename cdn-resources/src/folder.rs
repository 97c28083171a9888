//! Folders: named, owned sets of file ids.
//!
//! A [`Folder`] is an in-memory copy of one folder document. Mutations are
//! applied locally and queued as field updates; [`Folder::save`] persists
//! them in a single partial write. A folder never owns its member files.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use cdn_core::{bail_cdn, CdnConfig, CdnError, CdnResult, IdSource, OwnerId, RandomIds};
use cdn_docs::{DocumentStore, PendingUpdate, Snapshot};

use crate::file::{FileRecord, FileResource};

/// Persisted state of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    pub owner: OwnerId,
    /// Member file ids, first-seen order, no duplicates
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FolderDoc {
    id: String,
    owner: OwnerId,
    name: String,
    #[serde(default)]
    files: Vec<String>,
}

impl FolderRecord {
    fn from_snapshot(snapshot: &Snapshot) -> CdnResult<Self> {
        let doc: FolderDoc = snapshot.decode()?;
        Ok(Self {
            id: doc.id,
            name: doc.name,
            owner: doc.owner,
            files: doc.files,
            created_at: snapshot.create_time,
            updated_at: snapshot.update_time,
        })
    }
}

/// Listing entry for a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderSummary {
    pub id: String,
    pub name: String,
    /// Number of member files
    pub size: usize,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl From<&FolderRecord> for FolderSummary {
    fn from(record: &FolderRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            size: record.files.len(),
            create_time: record.created_at,
            update_time: record.updated_at,
        }
    }
}

/// Creates, loads and lists folders.
#[derive(Clone)]
pub struct FolderResource {
    docs: Arc<dyn DocumentStore>,
    ids: Arc<dyn IdSource>,
    config: Arc<CdnConfig>,
}

impl FolderResource {
    pub fn new(docs: Arc<dyn DocumentStore>, config: Arc<CdnConfig>) -> Self {
        let ids = Arc::new(RandomIds::new(config.id_length));
        Self { docs, ids, config }
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    fn open(&self, record: FolderRecord) -> Folder {
        Folder {
            record,
            pending: PendingUpdate::new(),
            cache: Vec::new(),
            docs: self.docs.clone(),
            folders_collection: self.config.folders_collection.clone(),
            files_collection: self.config.files_collection.clone(),
        }
    }

    /// Create an empty folder owned by `owner`.
    ///
    /// A taken id is retried with a fresh one, up to the configured number
    /// of attempts.
    #[instrument(skip(self, owner), fields(owner = %owner))]
    pub async fn create(&self, name: &str, owner: &OwnerId) -> CdnResult<Folder> {
        if name.is_empty() {
            bail_cdn!(validation, "Folder name required.");
        }

        let collection = &self.config.folders_collection;
        let attempts = self.config.id_attempts.max(1);

        for attempt in 1..=attempts {
            let id = self.ids.next_id();
            let doc = FolderDoc {
                id: id.clone(),
                owner: owner.clone(),
                name: name.to_string(),
                files: Vec::new(),
            };
            let body = serde_json::to_value(&doc).map_err(CdnError::store)?;

            match self.docs.create(collection, &id, body).await {
                Ok(written) => {
                    info!(id = %id, "folder created");
                    return Ok(self.open(FolderRecord {
                        id,
                        name: doc.name,
                        owner: doc.owner,
                        files: doc.files,
                        created_at: written.update_time,
                        updated_at: written.update_time,
                    }));
                }
                Err(e) if e.is_already_exists() => {
                    debug!(attempt, "folder id taken, drawing another");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CdnError::conflict(format!(
            "Could not allocate a unique id after {} attempts",
            attempts
        )))
    }

    /// Load a folder, optionally resolving its member files into the cache.
    pub async fn resolve(&self, id: &str, with_files: bool) -> CdnResult<Folder> {
        let snapshot = match self.docs.get(&self.config.folders_collection, id).await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_not_found() => return Err(CdnError::not_found("Folder not found")),
            Err(e) => return Err(e.into()),
        };

        let mut folder = self.open(FolderRecord::from_snapshot(&snapshot)?);
        if with_files {
            folder.load_files().await?;
        }
        Ok(folder)
    }

    /// Every folder `owner` owns.
    pub async fn list_for_owner(&self, owner: &OwnerId) -> CdnResult<Vec<FolderSummary>> {
        let snapshots = self.docs.list(&self.config.folders_collection).await?;

        let mut summaries = Vec::new();
        for snapshot in &snapshots {
            let record = FolderRecord::from_snapshot(snapshot)?;
            if &record.owner == owner {
                summaries.push(FolderSummary::from(&record));
            }
        }
        Ok(summaries)
    }
}

/// One folder held in memory, with its queued changes and member cache.
///
/// Clean after create or resolve; dirty after an effective mutation; clean
/// again after a successful save. Dropping a dirty folder discards its
/// changes.
pub struct Folder {
    record: FolderRecord,
    pending: PendingUpdate,
    cache: Vec<FileRecord>,
    docs: Arc<dyn DocumentStore>,
    folders_collection: String,
    files_collection: String,
}

impl std::fmt::Debug for Folder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Folder")
            .field("record", &self.record)
            .field("pending", &self.pending.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Folder {
    pub fn record(&self) -> &FolderRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn owner(&self) -> &OwnerId {
        &self.record.owner
    }

    pub fn files(&self) -> &[String] {
        &self.record.files
    }

    /// Member files resolved so far, in no particular completeness
    pub fn cached_files(&self) -> &[FileRecord] {
        &self.cache
    }

    pub fn pending(&self) -> &PendingUpdate {
        &self.pending
    }

    pub fn summary(&self) -> FolderSummary {
        FolderSummary::from(&self.record)
    }

    /// Re-resolve every member into the cache, in membership order.
    ///
    /// Member ids with no file document are skipped.
    pub async fn load_files(&mut self) -> CdnResult<()> {
        if self.record.files.is_empty() {
            self.cache.clear();
            return Ok(());
        }

        let values: Vec<Value> = self.record.files.iter().map(|id| json!(id)).collect();
        let snapshots = self
            .docs
            .query_where_in(&self.files_collection, "id", &values)
            .await?;

        let mut by_id = HashMap::with_capacity(snapshots.len());
        for snapshot in &snapshots {
            let file = FileRecord::from_snapshot(snapshot)?;
            by_id.insert(file.id.clone(), file);
        }

        self.cache = self
            .record
            .files
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();

        if self.cache.len() < self.record.files.len() {
            debug!(
                folder = %self.record.id,
                missing = self.record.files.len() - self.cache.len(),
                "folder references files with no metadata"
            );
        }
        Ok(())
    }

    /// Look a member up in the cache, falling back to the file store.
    ///
    /// A file found by the fallback joins the cache and, if it was not a
    /// member yet, the membership (queued for the next save).
    pub async fn file(&mut self, id: &str) -> CdnResult<Option<FileRecord>> {
        if let Some(cached) = self.cache.iter().find(|f| f.id == id) {
            return Ok(Some(cached.clone()));
        }

        let snapshot = match self.docs.get(&self.files_collection, id).await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file = FileRecord::from_snapshot(&snapshot)?;

        if !self.record.files.iter().any(|f| f == id) {
            self.record.files.push(id.to_string());
            self.queue_files();
        }
        self.cache.push(file.clone());

        Ok(Some(file))
    }

    /// Add ids to the membership, keeping first-seen order.
    ///
    /// With `also_cache` the member cache is re-resolved afterwards;
    /// otherwise a membership change drops the cache.
    pub async fn add_files<S: AsRef<str>>(&mut self, ids: &[S], also_cache: bool) -> CdnResult<()> {
        let mut seen: HashSet<String> = self.record.files.iter().cloned().collect();
        let before = self.record.files.len();

        for id in ids {
            let id = id.as_ref();
            if seen.insert(id.to_string()) {
                self.record.files.push(id.to_string());
            }
        }

        let changed = self.record.files.len() != before;
        if changed {
            self.queue_files();
        }

        if also_cache {
            self.load_files().await?;
        } else if changed {
            self.cache.clear();
        }
        Ok(())
    }

    /// Drop ids from the membership and the cache. Absent ids are ignored.
    pub fn remove_files<S: AsRef<str>>(&mut self, ids: &[S]) {
        let removing: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        let before = self.record.files.len();

        self.record.files.retain(|id| !removing.contains(id.as_str()));
        self.cache.retain(|file| !removing.contains(file.id.as_str()));

        if self.record.files.len() != before {
            self.queue_files();
        }
    }

    /// Rename the folder; the name must not be empty.
    pub fn set_name(&mut self, name: &str) -> CdnResult<()> {
        if name.is_empty() {
            bail_cdn!(validation, "Folder name required.");
        }
        self.record.name = name.to_string();
        self.pending.push("name", name);
        Ok(())
    }

    pub fn is_changed(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Persist queued changes in one write.
    ///
    /// Returns `false` without touching the store when nothing is queued.
    /// On failure the changes stay queued.
    #[instrument(skip(self), fields(id = %self.record.id, fields = self.pending.len()))]
    pub async fn save(&mut self) -> CdnResult<bool> {
        if self.pending.is_empty() {
            return Ok(false);
        }

        let written = self
            .docs
            .update(&self.folders_collection, &self.record.id, self.pending.as_slice())
            .await?;

        self.pending.clear();
        self.record.updated_at = written.update_time;
        debug!("folder saved");
        Ok(true)
    }

    pub fn check_owner(&self, caller: &OwnerId) -> CdnResult<()> {
        if &self.record.owner != caller {
            return Err(CdnError::forbidden("Cannot modify folder not owned."));
        }
        Ok(())
    }

    /// Delete the folder document. Member files are untouched.
    pub async fn delete(&self) -> CdnResult<()> {
        self.docs
            .delete(&self.folders_collection, &self.record.id)
            .await?;
        info!(id = %self.record.id, "folder deleted");
        Ok(())
    }

    /// Delete every member file `caller` owns, then the folder.
    ///
    /// Members owned by someone else, or already gone, are skipped. Returns
    /// the ids of the files deleted.
    pub async fn delete_with_files(
        &self,
        files: &FileResource,
        caller: &OwnerId,
    ) -> CdnResult<Vec<String>> {
        self.check_owner(caller)?;

        let mut deleted = Vec::new();
        for id in &self.record.files {
            let record = match files.resolve(id).await {
                Ok(record) => record,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            if &record.owner != caller {
                warn!(folder = %self.record.id, file = %id, "skipping member file owned by another user");
                continue;
            }
            files.delete(&record).await?;
            deleted.push(record.id);
        }

        self.delete().await?;
        Ok(deleted)
    }

    fn queue_files(&mut self) {
        self.pending.push("files", json!(self.record.files));
    }
}
