//! Transform stage: filter incomplete rows and derive the prefix flag.

use crate::error::Result;
use crate::record::RecordSet;

/// Column that must be populated for a row to survive.
pub const APPLICATION_ID: &str = "application_id";
/// Column the prefix flag is derived from.
pub const INDEX_PREFIX: &str = "index_prefix";
/// Derived column appended (or recomputed) by the transform.
pub const HAS_SPECIFIC_PREFIX: &str = "has_specific_prefix";

const SHOPIFY_PREFIX: &str = "shopify_";

/// Transformer trait over tabular-text payloads.
///
/// Implementations are pure functions of their input; the same payload
/// always transforms to the same output.
pub trait Transformer: Send + Sync {
    /// Transform a raw payload into the loadable form.
    ///
    /// # Errors
    /// Returns a contract violation when the payload is unparseable or
    /// lacks a required column.
    fn transform(&self, raw: &str) -> Result<String>;
}

/// Drops rows with an empty `application_id` and computes
/// `has_specific_prefix = index_prefix != "shopify_"` for the rest.
///
/// Surviving rows keep their original relative order and every original
/// column. The comparison is exact and case-sensitive. Applying the
/// transform to its own output is a no-op: incomplete rows are already
/// gone and the flag column is recomputed in place.
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchTransformer;

impl BatchTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for BatchTransformer {
    fn transform(&self, raw: &str) -> Result<String> {
        let records = RecordSet::parse(raw)?;
        let application_id = records.require_column(APPLICATION_ID)?;
        let index_prefix = records.require_column(INDEX_PREFIX)?;
        let flag_column = records.column_index(HAS_SPECIFIC_PREFIX);

        let mut headers = records.headers().to_vec();
        if flag_column.is_none() {
            headers.push(HAS_SPECIFIC_PREFIX.to_string());
        }

        let total = records.rows().len();
        let mut rows = Vec::with_capacity(total);
        for row in records.rows() {
            if row[application_id].is_empty() {
                continue;
            }
            let flag = (row[index_prefix] != SHOPIFY_PREFIX).to_string();
            let mut row = row.clone();
            match flag_column {
                Some(i) => row[i] = flag,
                None => row.push(flag),
            }
            rows.push(row);
        }

        let dropped = total - rows.len();
        if dropped > 0 {
            log::info!("Dropped {} row(s) with an empty {}", dropped, APPLICATION_ID);
        }
        log::info!("✓ Transformed {} row(s)", rows.len());

        RecordSet::new(headers, rows).to_csv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(raw: &str) -> Result<String> {
        BatchTransformer::new().transform(raw)
    }

    #[test]
    fn test_drops_empty_application_id_and_derives_flag() {
        let raw = "application_id,index_prefix\n\
                   1,shopify_\n\
                   2,other_prefix\n\
                   ,shopify_\n";

        let out = transform(raw).unwrap();
        assert_eq!(
            out,
            "application_id,index_prefix,has_specific_prefix\n\
             1,shopify_,false\n\
             2,other_prefix,true\n"
        );
    }

    #[test]
    fn test_prefix_match_is_exact_and_case_sensitive() {
        let raw = "application_id,index_prefix\n\
                   1,Shopify_\n\
                   2,shopify\n\
                   3,shopify_\n";

        let out = transform(raw).unwrap();
        assert_eq!(
            out,
            "application_id,index_prefix,has_specific_prefix\n\
             1,Shopify_,true\n\
             2,shopify,true\n\
             3,shopify_,false\n"
        );
    }

    #[test]
    fn test_passthrough_columns_and_order_are_preserved() {
        let raw = "application_id,index_prefix,region\n\
                   9,other,eu\n\
                   7,shopify_,us\n\
                   8,other,ap\n";

        let out = transform(raw).unwrap();
        assert_eq!(
            out,
            "application_id,index_prefix,region,has_specific_prefix\n\
             9,other,eu,true\n\
             7,shopify_,us,false\n\
             8,other,ap,true\n"
        );
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let raw = "application_id,index_prefix\n\
                   1,shopify_\n\
                   2,other_prefix\n\
                   ,shopify_\n";

        let once = transform(raw).unwrap();
        let twice = transform(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_existing_flag_column_is_recomputed_in_place() {
        let raw = "application_id,index_prefix,has_specific_prefix\n\
                   1,shopify_,true\n";

        let out = transform(raw).unwrap();
        assert_eq!(
            out,
            "application_id,index_prefix,has_specific_prefix\n\
             1,shopify_,false\n"
        );
    }

    #[test]
    fn test_missing_required_column_is_a_contract_violation() {
        let err = transform("application_id\n1\n").unwrap_err();
        assert!(err.to_string().contains(INDEX_PREFIX));

        let err = transform("index_prefix\nshopify_\n").unwrap_err();
        assert!(err.to_string().contains(APPLICATION_ID));
    }

    #[test]
    fn test_header_only_payload_transforms_to_header_only() {
        let out = transform("application_id,index_prefix\n").unwrap();
        assert_eq!(out, "application_id,index_prefix,has_specific_prefix\n");
    }
}
