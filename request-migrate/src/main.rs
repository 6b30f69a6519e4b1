use std::env;

use anyhow::{Context, Result};
use request_migrate::config::{store_source_from_env, MigrationConfig};
use request_migrate::MigrationExecutor;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("request_migrate=info,docstore=info"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        // Structured output for log shipping
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();

        info!(
            service_name = "request-migrate",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        // Pretty console output
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();

        info!(
            service_name = "request-migrate",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console format"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting tutoring request migration");

    let config = MigrationConfig::from_env().context("Invalid migration configuration")?;
    let source = store_source_from_env().context("Invalid store configuration")?;

    info!(
        requests_path = %config.requests_path.display(),
        offers_path = %config.offers_path.display(),
        batch_size = config.batch.batch_size,
        deadline_format = ?config.deadline_format,
        layout = ?config.layout,
        "Configuration loaded"
    );

    // Connect to the document store
    info!("Connecting to document store...");
    let store = source
        .connect()
        .await
        .context("Failed to connect to document store")?;
    info!("✓ Connected to document store");

    // Create and execute migration
    let executor = MigrationExecutor::new(store, config);
    let summary = executor.execute().await?;

    if !summary.is_complete() {
        for document in &summary.failed_documents {
            warn!(document = %document, "Document not migrated");
        }
    }

    Ok(())
}
