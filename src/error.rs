//! Failure taxonomy for pipeline stages.
//!
//! Every failure is either retriable by the scheduler or terminal until an
//! operator fixes the input. Nothing in this crate retries on its own; the
//! caller reads the classification and decides.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

/// Error returned by any pipeline stage.
///
/// The two variants are the two things a scheduler can do with a failed
/// run: try it again unchanged, or stop and page someone. Outcomes that are
/// not failures at all (a missing source object, an already-loaded batch)
/// are ordinary return values, not errors.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Store or warehouse access failed. The run may be retried as-is.
    #[error("transient access failure: {0}")]
    Transient(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The payload or destination schema broke the batch contract.
    /// Retrying cannot help; the source data needs operator attention.
    #[error("contract violation: {0}")]
    Contract(String),
}

impl EtlError {
    pub fn transient(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Transient(err.into())
    }

    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    /// Whether the scheduler may retry the failed run without changes.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<reqwest::Error> for EtlError {
    fn from(err: reqwest::Error) -> Self {
        Self::transient(err)
    }
}

impl From<csv::Error> for EtlError {
    fn from(err: csv::Error) -> Self {
        Self::Contract(format!("unparseable tabular payload: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_is_retriable() {
        let err = EtlError::transient("connection reset");
        assert!(err.is_retriable());
    }

    #[test]
    fn test_contract_is_terminal() {
        let err = EtlError::contract("missing column");
        assert!(!err.is_retriable());
        assert_eq!(err.to_string(), "contract violation: missing column");
    }
}
