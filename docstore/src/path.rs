//! Collection and document references.
//!
//! A path alternates collection and document ids: `requests/1` is a document,
//! `requests/1/tutor_offers` is a subcollection of it.

use std::fmt;

/// Reference to a (possibly nested) collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionRef {
    segments: Vec<String>,
}

/// Reference to a single document inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef {
    segments: Vec<String>,
}

impl CollectionRef {
    /// Create a reference to a top-level collection.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            segments: vec![id.into()],
        }
    }

    /// Reference the document with the given id in this collection.
    pub fn doc(&self, id: impl Into<String>) -> DocumentRef {
        let mut segments = self.segments.clone();
        segments.push(id.into());
        DocumentRef { segments }
    }

    /// The collection id (last path segment).
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The slash-joined path, relative to the database root.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

impl DocumentRef {
    /// Reference a subcollection nested under this document.
    pub fn collection(&self, id: impl Into<String>) -> CollectionRef {
        let mut segments = self.segments.clone();
        segments.push(id.into());
        CollectionRef { segments }
    }

    /// The document id (last path segment).
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The collection this document belongs to.
    pub fn parent(&self) -> CollectionRef {
        CollectionRef {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// The slash-joined path, relative to the database root.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
