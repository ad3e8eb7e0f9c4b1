use super::filter::RowPredicate;
use super::source::{Header, RecordSource};
use super::table::{quote_ident, Table};
use crate::core::errors::{LoadError, Result};
use crate::utils::progress::{NoProgress, Progress};
use itertools::Itertools;
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Sqlite};
use std::io::Read;
use std::ops::AddAssign;

/// Upper bound on bound parameters in one SQLite statement.
pub const SQLITE_MAX_VARIABLES: usize = 32_766;

const PROGRESS_INTERVAL: u64 = 4096;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Well-formed data rows read from the source.
    pub scanned: u64,
    /// Rows accepted by the predicate and written.
    pub matched: u64,
    /// Rows actually inserted; the rest collided with an existing primary key.
    pub inserted: u64,
    pub malformed: u64,
    pub batches: u64,
}

impl LoadStats {
    /// Matched rows dropped by `INSERT OR IGNORE`.
    pub fn ignored(&self) -> u64 {
        self.matched.saturating_sub(self.inserted)
    }
}

impl AddAssign for LoadStats {
    fn add_assign(&mut self, other: Self) {
        self.scanned += other.scanned;
        self.matched += other.matched;
        self.inserted += other.inserted;
        self.malformed += other.malformed;
        self.batches += other.batches;
    }
}

/// Streams rows accepted by a predicate into a table, `batch_size` rows per
/// committed transaction.
///
/// Writes are `INSERT OR IGNORE`, so loading the same rows again leaves the
/// table unchanged. A failure mid-file keeps the batches already committed.
pub struct SelectiveLoader<'a> {
    pool: &'a SqlitePool,
    batch_size: usize,
    progress: &'a dyn Progress,
}

impl<'a> SelectiveLoader<'a> {
    pub fn new(pool: &'a SqlitePool, batch_size: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.max(1),
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    pub async fn load<R, P>(
        &self,
        table: Table,
        source: &mut RecordSource<R>,
        keep: &P,
    ) -> Result<LoadStats>
    where
        R: Read,
        P: RowPredicate + ?Sized,
    {
        let columns = insert_columns(table, source)?;
        let statement_prefix = format!(
            "INSERT OR IGNORE INTO {} ({}) ",
            quote_ident(table.name()),
            columns.iter().map(|c| quote_ident(c)).join(", ")
        );

        let mut stats = LoadStats::default();
        let mut batch: Vec<Vec<String>> = Vec::with_capacity(self.batch_size.min(100_000));
        let mut unreported = 0;

        while let Some(row) = source.next_row()? {
            stats.scanned += 1;
            unreported += 1;
            if unreported == PROGRESS_INTERVAL {
                self.progress.rows_scanned(unreported);
                unreported = 0;
            }

            if !keep.keep(&row) {
                continue;
            }
            stats.matched += 1;
            batch.push(row.into_fields());

            if batch.len() >= self.batch_size {
                stats.inserted += self
                    .write_batch(&statement_prefix, columns.len(), &batch)
                    .await?;
                stats.batches += 1;
                batch.clear();
            }
        }

        // Write whatever's left
        if !batch.is_empty() {
            stats.inserted += self
                .write_batch(&statement_prefix, columns.len(), &batch)
                .await?;
            stats.batches += 1;
        }
        self.progress.rows_scanned(unreported);
        stats.malformed = source.malformed_rows();

        if stats.ignored() > 0 {
            log::debug!(
                "{} rows for table {} already present, ignored",
                stats.ignored(),
                table
            );
        }
        log::info!(
            "Populated table {} from {}: {} scanned, {} matched, {} inserted",
            table,
            source.path().display(),
            stats.scanned,
            stats.matched,
            stats.inserted
        );
        Ok(stats)
    }

    /// One transaction per batch, split into statements under the bind limit.
    async fn write_batch(
        &self,
        statement_prefix: &str,
        column_count: usize,
        rows: &[Vec<String>],
    ) -> Result<u64> {
        let rows_per_statement = (SQLITE_MAX_VARIABLES / column_count).max(1);
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(rows_per_statement) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(statement_prefix);
            builder.push_values(chunk, |mut values, row| {
                for value in row {
                    values.push_bind(value.as_str());
                }
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        log::debug!("Committed batch of {} rows ({} new)", rows.len(), inserted);
        Ok(inserted)
    }
}

/// Header columns, checked against the table: every column must exist in the
/// table and the primary key columns must all be present.
fn insert_columns<R: Read>(table: Table, source: &RecordSource<R>) -> Result<Vec<String>> {
    let header: &Header = source.header();
    if let Some(unknown) = header.columns().iter().find(|c| !table.has_column(c)) {
        return Err(LoadError::UnknownColumn {
            table: table.to_string(),
            column: unknown.clone(),
        });
    }
    for key in table.primary_key() {
        source.require_column(key)?;
    }
    Ok(header.columns().to_vec())
}
