//! # cdn-resources: the resource consistency layer
//!
//! Keeps a blob store (the bytes) and a document store (ownership, folder
//! membership, timestamps) coherent from the caller's point of view.
//!
//! ```text
//! ┌─────────────────┐
//! │   CdnService    │  ← what routes call
//! ├─────────────────┤
//! │ File / Folder   │  ← two-step writes, dirty tracking, member cache
//! ├────────┬────────┤
//! │ Blobs  │  Docs  │  ← cdn-blob / cdn-docs
//! └────────┴────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use cdn_blob::MemoryBlobStore;
//! use cdn_core::{CdnConfig, CdnResult, StaticTokenVerifier};
//! use cdn_docs::MemoryDocumentStore;
//! use cdn_resources::CdnService;
//!
//! # #[tokio::main]
//! # async fn main() -> CdnResult<()> {
//! let service = CdnService::new(
//!     CdnConfig::local("https://cdn.example.com", "https://bucket.example.com"),
//!     Arc::new(StaticTokenVerifier::new("s3cret", "alice")),
//!     Arc::new(MemoryBlobStore::new("assets")),
//!     Arc::new(MemoryDocumentStore::new()),
//! );
//!
//! let alice = service.authenticate("Bearer s3cret").await?;
//! let receipt = service.upload(&alice, Bytes::from_static(b"hello"), "hello.txt").await?;
//! assert!(receipt.url.ends_with(".txt"));
//! # Ok(())
//! # }
//! ```

pub mod embed;
pub mod file;
pub mod folder;
pub mod links;
pub mod service;

pub use embed::{human_size, is_preview_bot, Embed, EmbedKind};
pub use file::{FileRecord, FileResource};
pub use folder::{Folder, FolderRecord, FolderResource, FolderSummary};
pub use links::FileLinks;
pub use service::{CdnService, FolderPatch, UploadReceipt};
