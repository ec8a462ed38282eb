//! Batch identity.

use crate::error::EtlError;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Calendar date identifying one daily batch.
///
/// Each date maps deterministically to a single source object: the batch
/// for `2019-04-01` lives under the key `2019-04-01.csv`. Parsing is strict
/// `YYYY-MM-DD`; anything else is rejected before the pipeline starts.
///
/// # Example
/// ```
/// use shopify_data_etl::batch::BatchDate;
///
/// let date: BatchDate = "2019-04-01".parse().unwrap();
/// assert_eq!(date.object_key(), "2019-04-01.csv");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BatchDate(NaiveDate);

impl BatchDate {
    /// Key of the batch's source object in the store.
    pub fn object_key(&self) -> String {
        format!("{}.csv", self)
    }
}

impl FromStr for BatchDate {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| {
                EtlError::contract(format!("invalid batch date '{s}', expected YYYY-MM-DD"))
            })
    }
}

impl fmt::Display for BatchDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
