//! In-memory document store for testing and local development.
//!
//! `MemoryStore` applies batches atomically under a single lock and can be
//! told to reject the next N commits, so batch failure handling can be
//! exercised without a network.
//!
//! # Example
//!
//! ```ignore
//! use docstore::{CollectionRef, DocumentStore, MemoryStore, WriteBatch};
//!
//! let store = MemoryStore::new();
//! let mut batch = WriteBatch::new();
//! batch.set(CollectionRef::new("requests").doc("1"), Default::default());
//! store.commit(&batch).await?;
//! assert_eq!(store.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    CollectionRef, Document, DocumentRef, DocumentStore, StoreError, WriteBatch, MAX_BATCH_WRITES,
};

/// Document store that keeps every document in a sorted map.
pub struct MemoryStore {
    documents: Mutex<BTreeMap<DocumentRef, Document>>,
    /// Sizes of accepted commits, in commit order
    commits: Mutex<Vec<usize>>,
    failures_remaining: AtomicUsize,
    rejected: AtomicUsize,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(BTreeMap::new()),
            commits: Mutex::new(Vec::new()),
            failures_remaining: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
        }
    }

    /// Reject the next `count` commits with a [`StoreError::CommitError`].
    pub fn fail_next_commits(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Fetch a copy of the document at `document`, if present.
    pub fn get(&self, document: &DocumentRef) -> Option<Document> {
        self.documents.lock().unwrap().get(document).cloned()
    }

    /// Documents that are direct children of `collection`, ordered by path.
    pub fn list(&self, collection: &CollectionRef) -> Vec<(DocumentRef, Document)> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.parent() == *collection)
            .map(|(path, doc)| (path.clone(), doc.clone()))
            .collect()
    }

    /// Copy of every stored document.
    pub fn snapshot(&self) -> BTreeMap<DocumentRef, Document> {
        self.documents.lock().unwrap().clone()
    }

    /// Sizes of accepted commits, in commit order.
    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commits.lock().unwrap().clone()
    }

    /// Number of commits rejected through failure injection.
    pub fn rejected_commits(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    /// Get the number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.lock().unwrap().is_empty()
    }

    fn take_injected_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn commit(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        if batch.len() > MAX_BATCH_WRITES {
            return Err(StoreError::BatchSizeExceeded {
                provided: batch.len(),
                max: MAX_BATCH_WRITES,
            });
        }

        if self.take_injected_failure() {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::commit(format!(
                "injected failure for batch of {} writes",
                batch.len()
            )));
        }

        let mut documents = self.documents.lock().unwrap();
        for write in batch.writes() {
            documents.insert(write.document.clone(), write.fields.clone());
        }
        self.commits.lock().unwrap().push(batch.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    fn doc(fields: &[(&str, Value)]) -> Document {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_commit_upserts_whole_document() {
        let store = MemoryStore::new();
        let path = CollectionRef::new("requests").doc("1");

        let mut first = WriteBatch::new();
        first.set(
            path.clone(),
            doc(&[("label", "a".into()), ("locked", true.into())]),
        );
        store.commit(&first).await.unwrap();

        let mut second = WriteBatch::new();
        second.set(path.clone(), doc(&[("label", "b".into())]));
        store.commit(&second).await.unwrap();

        let stored = store.get(&path).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored["label"], Value::from("b"));
        assert_eq!(store.commit_sizes(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_injected_failure_is_atomic() {
        let store = MemoryStore::new();
        store.fail_next_commits(1);

        let mut batch = WriteBatch::new();
        batch.set(CollectionRef::new("requests").doc("1"), Document::new());
        batch.set(CollectionRef::new("requests").doc("2"), Document::new());

        let result = store.commit(&batch).await;
        assert!(matches!(result, Err(StoreError::CommitError(_))));
        assert!(store.is_empty());
        assert_eq!(store.rejected_commits(), 1);

        // Next commit goes through
        store.commit(&batch).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_oversized_batch() {
        let store = MemoryStore::new();
        let requests = CollectionRef::new("requests");
        let mut batch = WriteBatch::new();
        for i in 0..=MAX_BATCH_WRITES {
            batch.set(requests.doc(i.to_string()), Document::new());
        }

        let result = store.commit(&batch).await;
        assert!(matches!(
            result,
            Err(StoreError::BatchSizeExceeded { provided, max }) if provided == 501 && max == 500
        ));
    }

    #[tokio::test]
    async fn test_list_returns_direct_children_only() {
        let store = MemoryStore::new();
        let request = CollectionRef::new("requests").doc("1");
        let offers = request.collection("tutor_offers");

        let mut batch = WriteBatch::new();
        batch.set(request.clone(), Document::new());
        batch.set(offers.doc("10"), Document::new());
        batch.set(offers.doc("11"), Document::new());
        store.commit(&batch).await.unwrap();

        assert_eq!(store.list(&CollectionRef::new("requests")).len(), 1);
        let children: Vec<String> = store
            .list(&offers)
            .into_iter()
            .map(|(path, _)| path.id().to_string())
            .collect();
        assert_eq!(children, vec!["10", "11"]);
    }
}
