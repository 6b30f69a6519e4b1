//! Configuration constants and environment helpers.
//!
//! # Environment Variables
//!
//! - `REQUESTS_PATH`: request export (default: requests.json)
//! - `REQUEST_TUTOR_PATH`: tutor offer export (default: request_tutor.json)
//! - `EXPORT_LAYOUT`: "positional" or "named" (default: positional)
//! - `MIGRATION_BATCH_SIZE`: writes per commit, 1..=500 (default: 400)
//! - `DEADLINE_FORMAT`: "legacy" or "iso" (default: legacy)
//! - `COMMIT_MAX_RETRIES`: retries per failed commit (default: 3)
//! - `PROGRESS_INTERVAL`: requests between progress lines (default: 50)
//! - `GOOGLE_APPLICATION_CREDENTIALS`: service account key, required unless the emulator is used
//! - `FIRESTORE_PROJECT_ID`: overrides the key file's project
//! - `FIRESTORE_EMULATOR_HOST`: `host:port` of a local emulator
//! - `FIRESTORE_DATABASE`: database id (default: (default))

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use docstore::{StoreSource, DEFAULT_DATABASE, MAX_BATCH_WRITES};

use crate::errors::ConfigError;

// Input files
pub const DEFAULT_REQUESTS_PATH: &str = "requests.json";
pub const DEFAULT_OFFERS_PATH: &str = "request_tutor.json";

// Table names used by the named export layout
pub const REQUESTS_TABLE: &str = "requests";
pub const OFFERS_TABLE: &str = "request_tutor";

// Target collections
pub const REQUESTS_COLLECTION: &str = "requests";
pub const TUTOR_OFFERS_COLLECTION: &str = "tutor_offers";

// Batch processing configuration
pub const DEFAULT_BATCH_SIZE: usize = 400;
pub const DEFAULT_COMMIT_MAX_RETRIES: usize = 3;

// Progress reporting interval
pub const DEFAULT_PROGRESS_INTERVAL: usize = 50;

/// Project id used against the emulator when none is configured.
pub const DEFAULT_EMULATOR_PROJECT: &str = "demo-tutoring";

/// How the records array is located inside an export file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportLayout {
    /// `data` of the top-level element at index 2.
    #[default]
    Positional,
    /// `data` of the top-level element with `type: "table"` and a matching `name`.
    Named,
}

impl FromStr for ExportLayout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positional" | "index" => Ok(Self::Positional),
            "named" | "table" => Ok(Self::Named),
            _ => Err(ConfigError::invalid(
                "EXPORT_LAYOUT",
                s,
                "expected \"positional\" or \"named\"",
            )),
        }
    }
}

/// How `deadline` and `date` values (`2024-01-05T10:00:00.000Z`) are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeadlineFormat {
    /// Drop the trailing `.000Z` and parse as `YYYY-MM-DD HH:MM:SS`.
    ///
    /// The `T` separator survives the cut, so ISO values resolve to null.
    /// This reproduces what earlier migrations wrote.
    #[default]
    Legacy,
    /// Parse as an RFC 3339 timestamp.
    Iso,
}

impl FromStr for DeadlineFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "iso" | "rfc3339" => Ok(Self::Iso),
            _ => Err(ConfigError::invalid(
                "DEADLINE_FORMAT",
                s,
                "expected \"legacy\" or \"iso\"",
            )),
        }
    }
}

/// Configuration for the batch writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of staged writes that triggers a commit.
    pub batch_size: usize,
    /// Additional attempts for a failed commit before the batch is dropped.
    pub max_retries: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_COMMIT_MAX_RETRIES,
        }
    }
}

impl BatchConfig {
    /// Create a batch config, checking the size against the store's per-commit limit.
    pub fn new(batch_size: usize, max_retries: usize) -> Result<Self, ConfigError> {
        if batch_size == 0 || batch_size > MAX_BATCH_WRITES {
            return Err(ConfigError::BatchSizeOutOfRange {
                provided: batch_size,
                max: MAX_BATCH_WRITES,
            });
        }

        Ok(Self {
            batch_size,
            max_retries,
        })
    }
}

/// Everything the migration executor needs besides the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub requests_path: PathBuf,
    pub offers_path: PathBuf,
    pub layout: ExportLayout,
    pub deadline_format: DeadlineFormat,
    pub batch: BatchConfig,
    pub progress_interval: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            requests_path: PathBuf::from(DEFAULT_REQUESTS_PATH),
            offers_path: PathBuf::from(DEFAULT_OFFERS_PATH),
            layout: ExportLayout::default(),
            deadline_format: DeadlineFormat::default(),
            batch: BatchConfig::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl MigrationConfig {
    /// Read the migration configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the migration configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let requests_path = lookup("REQUESTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REQUESTS_PATH));
        let offers_path = lookup("REQUEST_TUTOR_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OFFERS_PATH));

        let layout = lookup("EXPORT_LAYOUT")
            .map(|v| v.parse::<ExportLayout>())
            .transpose()?
            .unwrap_or_default();
        let deadline_format = lookup("DEADLINE_FORMAT")
            .map(|v| v.parse::<DeadlineFormat>())
            .transpose()?
            .unwrap_or_default();

        let batch_size = parse_number(&lookup, "MIGRATION_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        let max_retries =
            parse_number(&lookup, "COMMIT_MAX_RETRIES", DEFAULT_COMMIT_MAX_RETRIES)?;
        let progress_interval =
            parse_number(&lookup, "PROGRESS_INTERVAL", DEFAULT_PROGRESS_INTERVAL)?;
        if progress_interval == 0 {
            return Err(ConfigError::invalid(
                "PROGRESS_INTERVAL",
                "0",
                "must be at least 1",
            ));
        }

        Ok(Self {
            requests_path,
            offers_path,
            layout,
            deadline_format,
            batch: BatchConfig::new(batch_size, max_retries)?,
            progress_interval,
        })
    }
}

/// Resolve the store backend from environment variables.
pub fn store_source_from_env() -> Result<StoreSource, ConfigError> {
    store_source_from_lookup(|name| env::var(name).ok())
}

/// Resolve the store backend through `lookup`.
///
/// `FIRESTORE_EMULATOR_HOST` wins over credentials; otherwise
/// `GOOGLE_APPLICATION_CREDENTIALS` is required.
pub fn store_source_from_lookup<F>(lookup: F) -> Result<StoreSource, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let project_id = non_empty(lookup("FIRESTORE_PROJECT_ID"));
    let database =
        non_empty(lookup("FIRESTORE_DATABASE")).unwrap_or_else(|| DEFAULT_DATABASE.to_string());

    if let Some(host) = non_empty(lookup("FIRESTORE_EMULATOR_HOST")) {
        return Ok(StoreSource::Emulator {
            host,
            project_id: project_id.unwrap_or_else(|| DEFAULT_EMULATOR_PROJECT.to_string()),
            database,
        });
    }

    let credentials_path = non_empty(lookup("GOOGLE_APPLICATION_CREDENTIALS"))
        .ok_or(ConfigError::Missing("GOOGLE_APPLICATION_CREDENTIALS"))?;

    Ok(StoreSource::Firestore {
        credentials_path: PathBuf::from(credentials_path),
        project_id,
        database,
    })
}

fn parse_number<F>(lookup: &F, name: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::invalid(name, raw.clone(), e.to_string())),
        None => Ok(default),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
