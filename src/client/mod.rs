//! Object store access.
//!
//! This module provides the [`ObjectStore`] trait for fetching blobs by
//! key, along with the HTTP implementation ([`HttpObjectStore`]) used
//! against the real store.

mod object_store;

pub use object_store::{FetchOutcome, HttpObjectStore, ObjectStore};
