//! Pipeline driver sequencing the three stages for one batch date.

use super::{ExtractOutcome, Extractor, LoadOutcome, Loader, Transformer};
use crate::batch::BatchDate;
use crate::error::Result;

/// Terminal outcome of one pipeline invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The batch was transformed and fully appended.
    Loaded(usize),
    /// The source object for the date does not exist; nothing ran.
    SkippedMissingBatch,
    /// The warehouse already contains the batch; nothing was inserted.
    SkippedDuplicate,
}

/// ETL pipeline for one batch date.
///
/// Stages run strictly in sequence, each stage's tabular-text output
/// feeding the next. The pipeline itself never retries and never runs more
/// than one date; scheduling, retry, and backfill belong to whoever calls
/// [`run`](Pipeline::run).
///
/// # Example
/// ```no_run
/// use shopify_data_etl::etl::{BatchExtractor, BatchTransformer, Pipeline, PostgresLoader};
/// # use shopify_data_etl::client::HttpObjectStore;
/// # use shopify_data_etl::config::PipelineConfig;
///
/// # async fn example(config: PipelineConfig) -> shopify_data_etl::error::Result<()> {
/// let store = HttpObjectStore::try_new(&config.store)?;
/// let pipeline = Pipeline::new(
///     BatchExtractor::new(store),
///     BatchTransformer::new(),
///     PostgresLoader::new(config.database),
/// );
///
/// let outcome = pipeline.run(&"2019-04-01".parse()?).await?;
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer,
    L: Loader,
{
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
        }
    }

    /// Run extract → transform → load for `date`.
    ///
    /// A missing source object short-circuits before transform or load run.
    ///
    /// # Errors
    /// Propagates the first stage failure untouched so the caller can read
    /// its retriable/terminal classification.
    pub async fn run(&self, date: &BatchDate) -> Result<PipelineOutcome> {
        log::info!("Starting pipeline for batch {}", date);

        let raw = match self.extractor.extract(date).await? {
            ExtractOutcome::Batch(raw) => raw,
            ExtractOutcome::NotFound => {
                log::warn!("No source object for {}, skipping batch", date);
                return Ok(PipelineOutcome::SkippedMissingBatch);
            }
        };

        let transformed = self.transformer.transform(&raw)?;

        match self.loader.load(&transformed).await? {
            LoadOutcome::Inserted(count) => {
                log::info!("✓ Pipeline complete, {} row(s) loaded", count);
                Ok(PipelineOutcome::Loaded(count))
            }
            LoadOutcome::SkippedDuplicate => {
                log::info!("Batch {} already loaded, nothing inserted", date);
                Ok(PipelineOutcome::SkippedDuplicate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct FixedExtractor(ExtractOutcome);

    impl Extractor for FixedExtractor {
        async fn extract(&self, _date: &BatchDate) -> Result<ExtractOutcome> {
            Ok(self.0.clone())
        }
    }

    struct UppercaseTransformer;

    impl Transformer for UppercaseTransformer {
        fn transform(&self, raw: &str) -> Result<String> {
            Ok(raw.to_uppercase())
        }
    }

    struct RecordingLoader {
        payloads: Arc<Mutex<Vec<String>>>,
        outcome: LoadOutcome,
    }

    #[async_trait]
    impl Loader for RecordingLoader {
        async fn load(&self, transformed: &str) -> Result<LoadOutcome> {
            self.payloads.lock().unwrap().push(transformed.to_string());
            Ok(self.outcome.clone())
        }
    }

    fn date() -> BatchDate {
        "2019-04-01".parse().unwrap()
    }

    #[tokio::test]
    async fn test_stages_are_threaded_in_order() {
        let payloads = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(
            FixedExtractor(ExtractOutcome::Batch("a,b\n1,2\n".to_string())),
            UppercaseTransformer,
            RecordingLoader {
                payloads: payloads.clone(),
                outcome: LoadOutcome::Inserted(1),
            },
        );

        let outcome = pipeline.run(&date()).await.unwrap();
        assert_eq!(outcome, PipelineOutcome::Loaded(1));
        assert_eq!(*payloads.lock().unwrap(), vec!["A,B\n1,2\n".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_batch_short_circuits() {
        let payloads = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(
            FixedExtractor(ExtractOutcome::NotFound),
            UppercaseTransformer,
            RecordingLoader {
                payloads: payloads.clone(),
                outcome: LoadOutcome::Inserted(1),
            },
        );

        let outcome = pipeline.run(&date()).await.unwrap();
        assert_eq!(outcome, PipelineOutcome::SkippedMissingBatch);
        assert!(payloads.lock().unwrap().is_empty(), "loader must not run");
    }

    #[tokio::test]
    async fn test_duplicate_load_is_reported() {
        let pipeline = Pipeline::new(
            FixedExtractor(ExtractOutcome::Batch("a\n1\n".to_string())),
            UppercaseTransformer,
            RecordingLoader {
                payloads: Arc::new(Mutex::new(Vec::new())),
                outcome: LoadOutcome::SkippedDuplicate,
            },
        );

        let outcome = pipeline.run(&date()).await.unwrap();
        assert_eq!(outcome, PipelineOutcome::SkippedDuplicate);
    }

    #[tokio::test]
    async fn test_transform_failure_propagates() {
        struct FailingTransformer;

        impl Transformer for FailingTransformer {
            fn transform(&self, _raw: &str) -> Result<String> {
                Err(EtlError::contract("required column 'index_prefix' is missing"))
            }
        }

        let pipeline = Pipeline::new(
            FixedExtractor(ExtractOutcome::Batch("a\n1\n".to_string())),
            FailingTransformer,
            RecordingLoader {
                payloads: Arc::new(Mutex::new(Vec::new())),
                outcome: LoadOutcome::Inserted(0),
            },
        );

        let err = pipeline.run(&date()).await.unwrap_err();
        assert!(!err.is_retriable());
    }
}
