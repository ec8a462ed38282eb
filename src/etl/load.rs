//! Load stage: append the batch to the warehouse unless it was seen before.

use crate::config::DatabaseConfig;
use crate::error::{EtlError, Result};
use crate::record::RecordSet;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Column, Row};
use std::collections::{HashMap, HashSet};

/// Destination table, created lazily on the first successful load.
pub const DEST_TABLE: &str = "shopify_data";

/// Postgres error code for a table that does not exist.
const UNDEFINED_TABLE: &str = "42P01";

/// Postgres caps bind parameters per statement at u16::MAX.
const BIND_LIMIT: usize = 65_535;

/// Outcome of loading one transformed batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Every row of the batch was appended.
    Inserted(usize),
    /// A duplicated row was detected; no rows were inserted.
    SkippedDuplicate,
}

/// Loader trait for persisting a transformed batch.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Load a transformed tabular payload into the destination.
    ///
    /// # Errors
    /// Returns a transient error on connectivity failures and a contract
    /// violation on malformed or schema-incompatible payloads. A batch
    /// that is already present is the [`LoadOutcome::SkippedDuplicate`]
    /// outcome, not an error.
    async fn load(&self, transformed: &str) -> Result<LoadOutcome>;
}

/// Appends whole batches to a Postgres table.
///
/// The batch is compared field-for-field against the full current table
/// contents. One duplicated row anywhere rejects the whole batch: daily
/// batches are assumed disjoint, so any collision means the batch was
/// already processed (typically a scheduler retry) and the safe move is to
/// skip it entirely rather than reconcile row by row. The append itself is
/// a single transaction, so the table only ever gains a complete batch.
///
/// The table is created on first use with one TEXT column per header; the
/// payload is untyped text and row equality is defined on the textual
/// field values.
pub struct PostgresLoader {
    config: DatabaseConfig,
    table: String,
}

impl PostgresLoader {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            table: DEST_TABLE.to_string(),
        }
    }

    /// Override the destination table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    async fn connect(&self) -> Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.config.url())
            .await
            .map_err(EtlError::transient)
    }

    /// Read the full current table contents with fields aligned to
    /// `headers` order. Returns `None` when the table does not exist yet.
    async fn existing_rows(
        &self,
        pool: &PgPool,
        headers: &[String],
    ) -> Result<Option<Vec<Vec<String>>>> {
        let query = format!("SELECT * FROM {}", quote_ident(&self.table));
        let rows = match sqlx::query(&query).fetch_all(pool).await {
            Ok(rows) => rows,
            Err(err) if is_undefined_table(&err) => return Ok(None),
            Err(err) => return Err(EtlError::transient(err)),
        };

        // An empty table has nothing to collide with, so only a populated
        // one gets the schema check
        if let Some(first) = rows.first() {
            let columns: Vec<String> = first.columns().iter().map(|c| c.name().to_string()).collect();
            check_column_sets(&columns, headers)?;
        }

        let mut existing = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(headers.len());
            for header in headers {
                let value: Option<String> = row.try_get(header.as_str()).map_err(|e| {
                    EtlError::contract(format!(
                        "destination table is schema-incompatible with the batch: {e}"
                    ))
                })?;
                // SQL NULL compares equal to an empty field
                values.push(value.unwrap_or_default());
            }
            existing.push(values);
        }
        Ok(Some(existing))
    }

    async fn create_table(&self, pool: &PgPool, headers: &[String]) -> Result<()> {
        let columns = headers
            .iter()
            .map(|h| format!("{} TEXT", quote_ident(h)))
            .collect::<Vec<_>>()
            .join(", ");
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.table),
            columns
        );
        sqlx::query(&ddl)
            .execute(pool)
            .await
            .map_err(EtlError::transient)?;
        Ok(())
    }

    /// Append all rows inside one transaction.
    async fn insert_rows(
        &self,
        pool: &PgPool,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let column_list = headers
            .iter()
            .map(|h| quote_ident(h))
            .collect::<Vec<_>>()
            .join(", ");
        let rows_per_statement = (BIND_LIMIT / headers.len().max(1)).max(1);

        let mut tx = pool.begin().await.map_err(EtlError::transient)?;
        for chunk in rows.chunks(rows_per_statement) {
            let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
                "INSERT INTO {} ({}) ",
                quote_ident(&self.table),
                column_list
            ));
            builder.push_values(chunk, |mut b, row| {
                for value in row {
                    b.push_bind(value);
                }
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(EtlError::transient)?;
        }
        tx.commit().await.map_err(EtlError::transient)?;
        Ok(())
    }
}

#[async_trait]
impl Loader for PostgresLoader {
    async fn load(&self, transformed: &str) -> Result<LoadOutcome> {
        let batch = RecordSet::parse(transformed)?;
        log::info!("Loading {} row(s) into {}", batch.rows().len(), self.table);

        let pool = self.connect().await?;
        let outcome = match self.existing_rows(&pool, batch.headers()).await? {
            None => {
                // First run: no table yet, nothing to collide with
                log::info!("First insert, creating table {}", self.table);
                self.create_table(&pool, batch.headers()).await?;
                self.insert_rows(&pool, batch.headers(), batch.rows())
                    .await?;
                LoadOutcome::Inserted(batch.rows().len())
            }
            Some(existing) => {
                if has_duplicates(&existing, batch.rows()) {
                    log::info!("Duplicates found, no rows inserted");
                    LoadOutcome::SkippedDuplicate
                } else {
                    self.insert_rows(&pool, batch.headers(), batch.rows())
                        .await?;
                    log::info!(
                        "✓ No duplicates found, {} row(s) inserted",
                        batch.rows().len()
                    );
                    LoadOutcome::Inserted(batch.rows().len())
                }
            }
        };
        pool.close().await;
        Ok(outcome)
    }
}

/// Whether the union of existing and incoming rows contains any row value
/// more than once.
///
/// Every collision counts, including duplicates already present inside the
/// table itself, so a table holding internal duplicates written by another
/// tool blocks every future load. Known false-negative hazard for batches
/// that are only partially new; the warehouse has always treated a
/// collision this way and callers depend on it.
fn has_duplicates(existing: &[Vec<String>], incoming: &[Vec<String>]) -> bool {
    let mut counts: HashMap<&[String], usize> = HashMap::new();
    for row in existing.iter().chain(incoming) {
        let count = counts.entry(row.as_slice()).or_insert(0);
        *count += 1;
        if *count > 1 {
            return true;
        }
    }
    false
}

/// The destination's column set must equal the batch's header set; a
/// NULL-padded append would silently change row equality semantics.
fn check_column_sets(table_columns: &[String], headers: &[String]) -> Result<()> {
    let table: HashSet<&str> = table_columns.iter().map(String::as_str).collect();
    let batch: HashSet<&str> = headers.iter().map(String::as_str).collect();
    if table != batch {
        let mut table_names = table_columns.to_vec();
        let mut header_names = headers.to_vec();
        table_names.sort();
        header_names.sort();
        return Err(EtlError::contract(format!(
            "destination table columns [{}] do not match batch columns [{}]",
            table_names.join(", "),
            header_names.join(", ")
        )));
    }
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn is_undefined_table(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNDEFINED_TABLE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_empty_table_accepts_any_batch() {
        let incoming = vec![row(&["1", "shopify_", "false"])];
        assert!(!has_duplicates(&[], &incoming));
    }

    #[test]
    fn test_identical_batch_is_rejected() {
        let existing = vec![
            row(&["1", "shopify_", "false"]),
            row(&["2", "other_prefix", "true"]),
        ];
        assert!(has_duplicates(&existing, &existing.clone()));
    }

    #[test]
    fn test_one_colliding_row_rejects_the_whole_batch() {
        let existing = vec![row(&["1", "shopify_", "false"])];
        let incoming = vec![
            row(&["2", "other_prefix", "true"]),
            row(&["1", "shopify_", "false"]),
        ];
        assert!(has_duplicates(&existing, &incoming));
    }

    #[test]
    fn test_unrelated_rows_do_not_collide() {
        let existing = vec![row(&["1", "shopify_", "false"])];
        let incoming = vec![
            row(&["2", "other_prefix", "true"]),
            row(&["3", "shopify_", "false"]),
        ];
        assert!(!has_duplicates(&existing, &incoming));
    }

    #[test]
    fn test_duplicate_within_the_batch_rejects_it() {
        let incoming = vec![
            row(&["2", "other_prefix", "true"]),
            row(&["2", "other_prefix", "true"]),
        ];
        assert!(has_duplicates(&[], &incoming));
    }

    #[test]
    fn test_rows_differing_in_one_field_are_distinct() {
        let existing = vec![row(&["1", "shopify_", "false"])];
        let incoming = vec![row(&["1", "shopify_", "true"])];
        assert!(!has_duplicates(&existing, &incoming));
    }

    #[test]
    fn test_column_sets_match_ignores_order() {
        let table = vec!["b".to_string(), "a".to_string()];
        let headers = vec!["a".to_string(), "b".to_string()];
        assert!(check_column_sets(&table, &headers).is_ok());
    }

    #[test]
    fn test_column_set_mismatch_is_a_contract_violation() {
        let table = vec!["a".to_string()];
        let headers = vec!["a".to_string(), "b".to_string()];
        let err = check_column_sets(&table, &headers).unwrap_err();
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("wei\"rd"), "\"wei\"\"rd\"");
    }
}
