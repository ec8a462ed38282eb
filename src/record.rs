//! Tabular payloads.
//!
//! Stages hand batches to each other as comma-separated text with a header
//! row. `RecordSet` is the parsed form: a header plus rows of string
//! fields. Parsing is strict; a ragged or unreadable payload is a contract
//! violation, never silently patched up.

use crate::error::{EtlError, Result};

/// A parsed tabular payload: header names plus rows of field values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordSet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordSet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Parse comma-separated text with a required header row.
    ///
    /// # Errors
    /// Returns a contract violation when the header is missing or any row
    /// fails to parse (ragged rows included).
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(EtlError::contract("tabular payload has no header row"));
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Re-serialize to comma-separated text, header row first.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| EtlError::contract(format!("failed to flush tabular writer: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| EtlError::contract(format!("serialized payload is not UTF-8: {e}")))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of a column that the batch contract requires to exist.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| EtlError::contract(format!("required column '{name}' is missing")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_and_rows() {
        let records = RecordSet::parse("a,b\n1,2\n3,4\n").unwrap();
        assert_eq!(records.headers(), ["a", "b"]);
        assert_eq!(records.rows(), [vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let text = "name,note\nwidget,\"has, comma\"\n";
        let records = RecordSet::parse(text).unwrap();
        assert_eq!(records.rows()[0], ["widget", "has, comma"]);
        assert_eq!(records.to_csv().unwrap(), text);
    }

    #[test]
    fn test_header_only_payload_is_valid() {
        let records = RecordSet::parse("a,b\n").unwrap();
        assert!(records.rows().is_empty());
    }

    #[test]
    fn test_empty_payload_is_a_contract_violation() {
        let err = RecordSet::parse("").unwrap_err();
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_ragged_row_is_a_contract_violation() {
        let err = RecordSet::parse("a,b\n1\n").unwrap_err();
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_column_lookup() {
        let records = RecordSet::parse("a,b\n1,2\n").unwrap();
        assert_eq!(records.column_index("b"), Some(1));
        assert_eq!(records.column_index("c"), None);
        assert!(records.require_column("c").is_err());
    }
}
