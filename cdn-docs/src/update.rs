//! Field-targeted partial writes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{DocError, DocResult};

/// One field assignment. `path` is dotted for nested fields (`meta.title`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub path: String,
    pub value: Value,
}

impl FieldUpdate {
    pub fn new(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    pub(crate) fn segments(&self) -> DocResult<Vec<&str>> {
        split_path(&self.path)
    }
}

pub(crate) fn split_path(path: &str) -> DocResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(DocError::invalid(format!("invalid field path '{}'", path)));
    }
    Ok(segments)
}

/// Read a dotted path out of a document.
pub fn field_at<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| current.get(segment))
}

/// Apply `update` to `doc`, creating intermediate objects as needed.
pub fn apply_update(doc: &mut Value, update: &FieldUpdate) -> DocResult<()> {
    let segments = update.segments()?;
    let Some((last, parents)) = segments.split_last() else {
        return Err(DocError::invalid("empty field path"));
    };

    let mut current = doc;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = current
            .as_object_mut()
            .map(|obj| obj.entry(segment.to_string()).or_insert(Value::Null))
            .ok_or_else(|| DocError::invalid("document is not an object"))?;
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Some(obj) = current.as_object_mut() {
        obj.insert(last.to_string(), update.value.clone());
    }
    Ok(())
}

/// Field assignments accumulated on an in-memory record before one write.
///
/// Each path appears once, in the order it was first assigned; assigning a
/// queued path again replaces its value. Non-empty means the record is dirty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingUpdate {
    updates: Vec<FieldUpdate>,
}

impl PendingUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        let update = FieldUpdate::new(path, value);
        match self.updates.iter_mut().find(|u| u.path == update.path) {
            Some(queued) => queued.value = update.value,
            None => self.updates.push(update),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldUpdate> {
        self.updates.iter()
    }

    pub fn as_slice(&self) -> &[FieldUpdate] {
        &self.updates
    }

    /// Drain every queued assignment, leaving this changeset clean.
    pub fn take(&mut self) -> Vec<FieldUpdate> {
        std::mem::take(&mut self.updates)
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }
}

impl<'a> IntoIterator for &'a PendingUpdate {
    type Item = &'a FieldUpdate;
    type IntoIter = std::slice::Iter<'a, FieldUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.iter()
    }
}
