//! Shopify Data ETL
//!
//! A daily batch pipeline: pull one day's CSV export from a public object
//! store, drop incomplete rows, derive the prefix flag, and append the
//! batch to a Postgres warehouse exactly once.

pub mod batch;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod etl;
pub mod record;

// Re-exports for convenience
pub use batch::BatchDate;
pub use client::{FetchOutcome, HttpObjectStore, ObjectStore};
pub use config::{DatabaseConfig, PipelineConfig, StoreConfig};
pub use error::EtlError;
pub use etl::{
    BatchExtractor, BatchTransformer, Extractor, LoadOutcome, Loader, Pipeline, PipelineOutcome,
    PostgresLoader, Transformer,
};
pub use record::RecordSet;
