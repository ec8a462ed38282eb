//! CLI helper functions
//!
//! One function per subcommand: build the configured components, wire them
//! into a pipeline (or a single stage), and return the typed outcome for
//! `main` to report.

use crate::batch::BatchDate;
use crate::client::HttpObjectStore;
use crate::config::PipelineConfig;
use crate::error::{EtlError, Result};
use crate::etl::{
    BatchExtractor, BatchTransformer, ExtractOutcome, Extractor, LoadOutcome, Loader, Pipeline,
    PipelineOutcome, PostgresLoader, Transformer,
};
use eyre::Context;
use sqlx::postgres::PgPoolOptions;
use std::io::Read;
use std::path::Path;

/// Run the full extract → transform → load pipeline for one batch date.
pub async fn run_batch(config: &PipelineConfig, date: &BatchDate) -> Result<PipelineOutcome> {
    let store = HttpObjectStore::try_new(&config.store)?;
    let pipeline = Pipeline::new(
        BatchExtractor::new(store),
        BatchTransformer::new(),
        PostgresLoader::new(config.database.clone()),
    );
    pipeline.run(date).await
}

/// Fetch one batch's raw payload from the object store.
pub async fn extract_batch(config: &PipelineConfig, date: &BatchDate) -> Result<ExtractOutcome> {
    let store = HttpObjectStore::try_new(&config.store)?;
    BatchExtractor::new(store).extract(date).await
}

/// Transform a raw payload: drop incomplete rows, derive the prefix flag.
pub fn transform_text(raw: &str) -> Result<String> {
    BatchTransformer::new().transform(raw)
}

/// Load an already-transformed payload into the warehouse.
pub async fn load_batch(config: &PipelineConfig, transformed: &str) -> Result<LoadOutcome> {
    PostgresLoader::new(config.database.clone())
        .load(transformed)
        .await
}

/// Probe object store and database connectivity.
pub async fn check(config: &PipelineConfig) -> Result<()> {
    let store = HttpObjectStore::try_new(&config.store)?;
    store.check().await?;
    log::info!("✓ Object store endpoint reachable");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database.url())
        .await
        .map_err(EtlError::transient)?;
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(EtlError::transient)?;
    pool.close().await;
    log::info!("✓ Database connection OK");

    Ok(())
}

/// Read a tabular payload from a file, or stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> eyre::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}
