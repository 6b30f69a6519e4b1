//! Client for a hierarchical document store.
//!
//! This crate provides:
//! - [`Value`] / [`Document`] typed document bodies
//! - [`CollectionRef`] / [`DocumentRef`] for addressing nested collections
//! - [`WriteBatch`] for staging upserts that commit atomically
//! - [`DocumentStore`] trait for abstracting the backend
//! - [`FirestoreStore`] production backend (REST API, or a local emulator)
//! - [`MemoryStore`] in-memory backend for testing
//!
//! ## Usage with StoreSource (Recommended)
//!
//! ```ignore
//! use docstore::{CollectionRef, StoreSource, WriteBatch};
//!
//! let store = StoreSource::emulator("localhost:8080", "demo-project").connect().await?;
//!
//! let mut batch = WriteBatch::new();
//! batch.set(CollectionRef::new("requests").doc("1"), document);
//! store.commit(&batch).await?;
//! ```

mod batch;
mod error;
pub mod firestore;
mod memory;
mod path;
mod value;

pub use batch::{Write, WriteBatch};
pub use error::StoreError;
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use path::{CollectionRef, DocumentRef};
pub use value::{Document, Value};

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

/// Maximum number of writes a single commit may carry.
pub const MAX_BATCH_WRITES: usize = 500;

/// Default database id.
pub const DEFAULT_DATABASE: &str = "(default)";

/// Trait for committing batches of document writes.
///
/// Production code uses [`FirestoreStore`]; tests use [`MemoryStore`].
/// A commit is atomic: either every write in the batch is applied or none is.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Apply every write in `batch` as one atomic commit.
    async fn commit(&self, batch: &WriteBatch) -> Result<(), StoreError>;
}

/// Configuration for the document store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    /// Managed Firestore, authenticated with a service account key file.
    Firestore {
        credentials_path: PathBuf,
        /// Overrides the key file's `project_id` when set.
        project_id: Option<String>,
        database: String,
    },

    /// Local Firestore emulator; no credentials needed.
    Emulator {
        /// `host:port` of the emulator
        host: String,
        project_id: String,
        database: String,
    },
}

impl StoreSource {
    /// Create an emulator source using the default database.
    pub fn emulator(host: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self::Emulator {
            host: host.into(),
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }

    /// Build the backend for this source.
    pub async fn connect(self) -> Result<Arc<dyn DocumentStore>, StoreError> {
        match self {
            Self::Firestore {
                credentials_path,
                project_id,
                database,
            } => {
                let store =
                    FirestoreStore::connect(&credentials_path, project_id, &database).await?;
                Ok(Arc::new(store))
            }
            Self::Emulator {
                host,
                project_id,
                database,
            } => Ok(Arc::new(FirestoreStore::emulator(
                &host,
                &project_id,
                &database,
            ))),
        }
    }
}
