//! Object store client module
//!
//! The source bucket is public and read-only, so every request is an
//! anonymous path-style HTTP GET. The [`ObjectStore`] trait is the seam
//! that lets tests substitute an in-memory store for the remote one.

use crate::config::StoreConfig;
use crate::error::{EtlError, Result};
use async_trait::async_trait;
use url::Url;

/// Outcome of fetching a single object.
///
/// A missing key is a first-class outcome rather than an error: callers
/// decide what an absent object means for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The object's bytes, exactly as stored.
    Found(Vec<u8>),
    /// No object exists under the requested key.
    NotFound,
}

/// A store of blobs addressable by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a single object by key.
    ///
    /// # Errors
    /// Returns a transient error on connectivity or unexpected store
    /// responses; a missing key is reported through [`FetchOutcome`].
    async fn fetch(&self, key: &str) -> Result<FetchOutcome>;
}

/// S3-compatible store accessed with unauthenticated path-style GETs.
///
/// # Example
/// ```no_run
/// use shopify_data_etl::client::{HttpObjectStore, ObjectStore};
/// use shopify_data_etl::config::StoreConfig;
///
/// # async fn example() -> shopify_data_etl::error::Result<()> {
/// # let config = StoreConfig::new("https://s3.amazonaws.com", "daily-exports").unwrap();
/// let store = HttpObjectStore::try_new(&config)?;
/// let outcome = store.fetch("2019-04-01.csv").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: Url,
    bucket: String,
}

impl HttpObjectStore {
    /// Create a client for the configured endpoint and bucket.
    pub fn try_new(config: &StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            bucket: config.bucket.clone(),
        })
    }

    fn object_url(&self, key: &str) -> Result<Url> {
        self.endpoint
            .join(&format!("{}/{}", self.bucket, key))
            .map_err(|e| EtlError::contract(format!("invalid object URL for key '{key}': {e}")))
    }

    /// Reachability probe: any HTTP response from the bucket counts.
    pub async fn check(&self) -> Result<()> {
        let url = self.object_url("")?;
        self.client.get(url).send().await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn fetch(&self, key: &str) -> Result<FetchOutcome> {
        let url = self.object_url(key)?;
        log::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(FetchOutcome::NotFound);
        }

        // S3 answers 403 for a missing key only when list permission is
        // absent; the public bucket grants it, so 404 is the only
        // missing-key signal here
        let response = response.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(FetchOutcome::Found(bytes.to_vec()))
    }
}
