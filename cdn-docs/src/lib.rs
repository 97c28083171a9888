//! cdn-docs: document storage for cdn-rs.
//!
//! Ownership, folder membership and timestamps live here, next to but
//! separate from the bytes in `cdn-blob`. Writes are partial: a record
//! accumulates [`FieldUpdate`]s in a [`PendingUpdate`] and persists them
//! in one [`DocumentStore::update`] call.

mod error;
mod memory;
pub mod store;
pub mod update;

pub use error::{DocError, DocResult};
pub use memory::{DocOp, MemoryDocumentStore, MAX_IN_VALUES};
pub use store::{DocumentStore, Snapshot, WriteResult};
pub use update::{apply_update, field_at, FieldUpdate, PendingUpdate};
