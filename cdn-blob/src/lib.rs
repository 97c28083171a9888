//! # cdn-blob: object storage for cdn-rs
//!
//! `cdn-blob` owns the bytes side of every stored file. It offers:
//!
//! - **`BlobStore`**: the storage primitives (put/get/head/delete/list page)
//!   against a single bucket
//! - **`S3CompatibleStore`**: DigitalOcean Spaces, MinIO or S3 through `aws-sdk-s3`
//! - **`MemoryBlobStore`**: in-process store with failure injection for tests
//! - **Content sniffing**: content type decided from the leading bytes only
//! - **Listing**: a lazy stream over the whole bucket and a by-key listing
//!
//! ## Quick Start
//!
//! ```rust
//! use bytes::Bytes;
//! use cdn_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let store = MemoryBlobStore::new("assets");
//! let data = Bytes::from_static(b"\x89PNG\r\n\x1a\n0000");
//!
//! let key = object_key("aZ3k9QpX", file_extension("cat.png"));
//! store.put(&key, data.clone(), sniff_content_type(&data), ObjectAcl::PublicRead).await?;
//!
//! let head = store.head(&key).await?;
//! assert_eq!(head.content_type.as_deref(), Some("image/png"));
//! # Ok(())
//! # }
//! ```

mod error;
pub mod keys;
pub mod listing;
mod memory_store;
mod s3_store;
pub mod sniff;
pub mod store;

pub use error::{BlobError, BlobResult};
pub use keys::{file_extension, object_key};
pub use listing::{list_all_objects, list_by_keys, ObjectStream};
pub use memory_store::{BlobOp, MemoryBlobStore, DEFAULT_PAGE_SIZE};
pub use s3_store::S3CompatibleStore;
pub use sniff::{sniff_content_type, OCTET_STREAM};
pub use store::{BlobStore, GetResult, ListPage, ObjectAcl, ObjectHead, ObjectSummary, PutResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        file_extension, object_key, sniff_content_type, BlobError, BlobResult, BlobStore,
        MemoryBlobStore, ObjectAcl, ObjectSummary,
    };
}
