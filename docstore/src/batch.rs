//! Write batches.

use crate::path::DocumentRef;
use crate::value::Document;

/// A full-replacement upsert of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub document: DocumentRef,
    pub fields: Document,
}

/// Ordered set of writes committed atomically by [`crate::DocumentStore::commit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            writes: Vec::with_capacity(capacity),
        }
    }

    /// Stage an upsert that replaces the whole document at `document`.
    pub fn set(&mut self, document: DocumentRef, fields: Document) {
        self.writes.push(Write { document, fields });
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Paths of every staged write, in staging order.
    pub fn documents(&self) -> impl Iterator<Item = &DocumentRef> {
        self.writes.iter().map(|w| &w.document)
    }
}
