//! Firestore backend speaking the REST `documents:commit` API.

mod auth;
mod encode;

pub use auth::ServiceAccountKey;

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::{DocumentStore, StoreError, WriteBatch, MAX_BATCH_WRITES};
use auth::TokenProvider;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

/// Bearer token the emulator accepts in place of real credentials.
const EMULATOR_TOKEN: &str = "owner";

enum Auth {
    ServiceAccount(TokenProvider),
    Emulator,
}

/// Firestore client that commits write batches over HTTPS.
///
/// Every write in a batch is an `update` without a precondition or field
/// mask, so the target document is created or fully replaced.
pub struct FirestoreStore {
    http: Client,
    base_url: String,
    database_path: String,
    auth: Auth,
}

impl FirestoreStore {
    /// Connect using a service account key file.
    ///
    /// Fetches an access token immediately so bad credentials fail the run
    /// before any data is read.
    pub async fn connect(
        credentials_path: &Path,
        project_id: Option<String>,
        database: &str,
    ) -> Result<Self, StoreError> {
        let key = ServiceAccountKey::from_file(credentials_path).await?;
        let project_id = project_id.unwrap_or_else(|| key.project_id.clone());
        let http = Client::new();

        let provider = TokenProvider::new(key, http.clone())?;
        provider.token().await?;

        info!(project_id = %project_id, database = %database, "Authenticated with Firestore");

        Ok(Self {
            http,
            base_url: FIRESTORE_BASE_URL.to_string(),
            database_path: database_path(&project_id, database),
            auth: Auth::ServiceAccount(provider),
        })
    }

    /// Point at a local Firestore emulator (`host:port`).
    pub fn emulator(host: &str, project_id: &str, database: &str) -> Self {
        info!(host = %host, project_id = %project_id, "Using Firestore emulator");

        Self {
            http: Client::new(),
            base_url: format!("http://{}", host),
            database_path: database_path(project_id, database),
            auth: Auth::Emulator,
        }
    }

    fn commit_url(&self) -> String {
        format!("{}/v1/{}/documents:commit", self.base_url, self.database_path)
    }

    async fn bearer_token(&self) -> Result<String, StoreError> {
        match &self.auth {
            Auth::ServiceAccount(provider) => provider.token().await,
            Auth::Emulator => Ok(EMULATOR_TOKEN.to_string()),
        }
    }
}

fn database_path(project_id: &str, database: &str) -> String {
    format!("projects/{}/databases/{}", project_id, database)
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn commit(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        if batch.len() > MAX_BATCH_WRITES {
            return Err(StoreError::BatchSizeExceeded {
                provided: batch.len(),
                max: MAX_BATCH_WRITES,
            });
        }

        let body = encode::commit_body(&self.database_path, batch);
        let token = self.bearer_token().await?;

        debug!(writes = batch.len(), "Committing batch to Firestore");

        let response = self
            .http
            .post(self.commit_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::CommitRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectionRef;

    #[test]
    fn test_emulator_urls() {
        let store = FirestoreStore::emulator("localhost:8080", "demo-project", "(default)");

        assert_eq!(
            store.commit_url(),
            "http://localhost:8080/v1/projects/demo-project/databases/(default)/documents:commit"
        );
        assert_eq!(
            encode::document_name(
                &store.database_path,
                &CollectionRef::new("requests").doc("7")
            ),
            "projects/demo-project/databases/(default)/documents/requests/7"
        );
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        // Port 9 (discard) is never contacted for an empty batch
        let store = FirestoreStore::emulator("127.0.0.1:9", "demo-project", "(default)");
        store.commit(&WriteBatch::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_emulator_uses_owner_token() {
        let store = FirestoreStore::emulator("localhost:8080", "demo-project", "(default)");
        assert_eq!(store.bearer_token().await.unwrap(), "owner");
    }
}
