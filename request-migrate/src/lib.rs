//! Migration of tutoring requests and their tutor offers from JSON exports
//! into the document store.
//!
//! Pipeline: [`loader`] reads both exports, [`indexer`] groups offers by
//! request, [`mapper`] shapes each record into its document, and [`writer`]
//! commits the documents in batches. [`executor::MigrationExecutor`] runs
//! the whole thing against an injected [`docstore::DocumentStore`].

pub mod config;
pub mod dates;
pub mod errors;
pub mod executor;
pub mod indexer;
pub mod loader;
pub mod mapper;
pub mod writer;

pub use config::{BatchConfig, DeadlineFormat, ExportLayout, MigrationConfig};
pub use errors::{ConfigError, MigrationError};
pub use executor::{MigrationExecutor, MigrationSummary};
