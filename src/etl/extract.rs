//! Extract stage: one daily CSV object out of the store.

use crate::batch::BatchDate;
use crate::client::{FetchOutcome, ObjectStore};
use crate::error::{EtlError, Result};

/// Outcome of extracting one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The raw tabular payload, byte-for-byte as stored, decoded as UTF-8.
    Batch(String),
    /// The batch's source object does not exist. The whole batch is
    /// skipped for this date; this is not a failure and must not be
    /// retried.
    NotFound,
}

/// Extractor trait for pulling one batch's raw payload.
///
/// Implementors resolve a batch date to a payload from wherever their
/// batches live (an object store, a directory of exports, a fixture map in
/// tests).
pub trait Extractor: Send + Sync {
    /// Extract the raw payload for `date`.
    ///
    /// # Errors
    /// Returns an error only for real failures; an absent batch is the
    /// [`ExtractOutcome::NotFound`] outcome.
    fn extract(
        &self,
        date: &BatchDate,
    ) -> impl std::future::Future<Output = Result<ExtractOutcome>> + Send;
}

/// Extracts `{date}.csv` from an object store.
pub struct BatchExtractor<S> {
    store: S,
}

impl<S: ObjectStore> BatchExtractor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ObjectStore> Extractor for BatchExtractor<S> {
    async fn extract(&self, date: &BatchDate) -> Result<ExtractOutcome> {
        let key = date.object_key();
        log::info!("Extracting {} from the object store", key);

        match self.store.fetch(&key).await? {
            FetchOutcome::Found(bytes) => {
                let text = String::from_utf8(bytes)
                    .map_err(|e| EtlError::contract(format!("{key} is not valid UTF-8: {e}")))?;
                log::info!("✓ Extracted {} ({} bytes)", key, text.len());
                Ok(ExtractOutcome::Batch(text))
            }
            FetchOutcome::NotFound => {
                log::warn!("{} does not exist in the store", key);
                Ok(ExtractOutcome::NotFound)
            }
        }
    }
}
