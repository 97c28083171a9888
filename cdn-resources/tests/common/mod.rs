#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use cdn_blob::MemoryBlobStore;
use cdn_core::{CdnConfig, IdSource, OwnerId, StaticTokenVerifier};
use cdn_docs::MemoryDocumentStore;
use cdn_resources::{CdnService, FileResource, FolderResource};

pub const CDN: &str = "https://cdn.example.com";
pub const BUCKET_URL: &str = "https://bucket.example.com";

/// Hands out ids from a fixed script, then falls back to numbered ids.
pub struct ScriptedIds {
    script: Mutex<VecDeque<String>>,
    counter: Mutex<usize>,
}

impl ScriptedIds {
    pub fn new(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(ids.iter().map(|s| s.to_string()).collect()),
            counter: Mutex::new(0),
        })
    }
}

impl IdSource for ScriptedIds {
    fn next_id(&self) -> String {
        if let Some(id) = self.script.lock().pop_front() {
            return id;
        }
        let mut counter = self.counter.lock();
        *counter += 1;
        format!("gen{:05}", *counter)
    }
}

pub struct Harness {
    pub config: Arc<CdnConfig>,
    pub blobs: Arc<MemoryBlobStore>,
    pub docs: Arc<MemoryDocumentStore>,
    pub files: FileResource,
    pub folders: FolderResource,
}

pub fn config() -> CdnConfig {
    let mut config = CdnConfig::local(CDN, BUCKET_URL);
    config.spaces.cdn_url = "https://bucket.cdn.example.com".to_string();
    config
}

pub fn harness() -> Harness {
    harness_with_page_size(cdn_blob::DEFAULT_PAGE_SIZE)
}

pub fn harness_with_page_size(page_size: usize) -> Harness {
    let config = Arc::new(config());
    let blobs = Arc::new(MemoryBlobStore::new("assets").with_page_size(page_size));
    let docs = Arc::new(MemoryDocumentStore::new());

    Harness {
        files: FileResource::new(blobs.clone(), docs.clone(), config.clone()),
        folders: FolderResource::new(docs.clone(), config.clone()),
        config,
        blobs,
        docs,
    }
}

pub fn service(h: &Harness, token: &str, owner: &str) -> CdnService {
    CdnService::new(
        (*h.config).clone(),
        Arc::new(StaticTokenVerifier::new(token, owner)),
        h.blobs.clone(),
        h.docs.clone(),
    )
}

pub fn alice() -> OwnerId {
    OwnerId::new("alice")
}

pub fn bob() -> OwnerId {
    OwnerId::new("bob")
}

/// PNG signature plus two bytes: ten bytes total.
pub fn png_10() -> Bytes {
    Bytes::from_static(b"\x89PNG\r\n\x1a\n\x00\x00")
}
