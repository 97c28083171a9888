//! Random opaque ids for files and folders.
//!
//! Ids are fixed-length strings over the 62 ASCII alphanumerics. They are
//! short because they end up in public URLs; uniqueness is checked by the
//! caller against the document store, not here.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generate one random id of `length` characters.
pub fn random_id(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Source of candidate ids.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Thread-local RNG backed id source.
#[derive(Debug, Clone)]
pub struct RandomIds {
    length: usize,
}

impl RandomIds {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new(8)
    }
}

impl IdSource for RandomIds {
    fn next_id(&self) -> String {
        random_id(self.length)
    }
}
