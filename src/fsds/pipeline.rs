use super::filter::{FilingSet, RowFilter, TagVersionSet};
use super::loader::{LoadStats, SelectiveLoader};
use super::quarters::{quarter_locations, QuarterLocation};
use super::resolve;
use super::source::RecordSource;
use super::table::Table;
use crate::core::config::{LoaderConfig, MissingQuarterPolicy};
use crate::core::errors::{LoadError, Result};
use crate::core::types::{ResetMode, Selection};
use crate::db;
use crate::utils::progress::{NoProgress, Phase, Progress};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct QuarterSummary {
    pub quarter: String,
    pub tag_versions: usize,
    pub tables: BTreeMap<Table, LoadStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub company: String,
    pub forms: String,
    pub filings: usize,
    pub wiped: bool,
    pub quarters: Vec<QuarterSummary>,
    /// Quarters left out because a source file was missing.
    pub skipped: Vec<String>,
}

impl RunSummary {
    pub fn totals(&self) -> BTreeMap<Table, LoadStats> {
        let mut totals: BTreeMap<Table, LoadStats> = BTreeMap::new();
        for quarter in &self.quarters {
            for (table, stats) in &quarter.tables {
                *totals.entry(*table).or_default() += *stats;
            }
        }
        totals
    }
}

/// Runs a selection end to end: resolves the filing set across every quarter,
/// then loads each quarter's four tables filtered by it.
///
/// The filing set is fixed before the first write. If it is empty the run stops
/// with `LoadError::EmptySelection` and the store is not touched.
pub struct Pipeline<'a> {
    pool: &'a SqlitePool,
    config: &'a LoaderConfig,
    progress: &'a dyn Progress,
}

impl<'a> Pipeline<'a> {
    pub fn new(pool: &'a SqlitePool, config: &'a LoaderConfig) -> Self {
        Self {
            pool,
            config,
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(&self, selection: &Selection) -> Result<RunSummary> {
        selection.validate()?;

        let locations =
            quarter_locations(&self.config.data_dir, &selection.years, &selection.forms);
        let (quarters, skipped) = self.available_quarters(locations)?;
        if quarters.is_empty() {
            if let Some(path) = skipped.first().and_then(|q| q.missing_files().into_iter().next()) {
                return Err(LoadError::NotFound(path));
            }
        }

        let filings = self.resolve_filings(selection, &quarters)?;
        if filings.is_empty() {
            return Err(LoadError::EmptySelection {
                company: selection.company.clone(),
                forms: selection.forms_label(),
            });
        }
        log::info!(
            "Resolved {} filings for '{}' across {} quarters",
            filings.len(),
            selection.company,
            quarters.len()
        );

        let wiped = selection.reset == ResetMode::Wipe;
        if wiped {
            db::reset_tables(self.pool).await?;
        }

        let mut summaries = Vec::with_capacity(quarters.len());
        for quarter in &quarters {
            summaries.push(self.load_quarter(quarter, &filings).await?);
        }

        Ok(RunSummary {
            company: selection.company.clone(),
            forms: selection.forms_label(),
            filings: filings.len(),
            wiped,
            quarters: summaries,
            skipped: skipped.iter().map(|q| q.to_string()).collect(),
        })
    }

    /// Splits locations into complete quarters and quarters lacking a source file.
    fn available_quarters(
        &self,
        locations: Vec<QuarterLocation>,
    ) -> Result<(Vec<QuarterLocation>, Vec<QuarterLocation>)> {
        let mut available = Vec::new();
        let mut skipped = Vec::new();

        for location in locations {
            let missing = location.missing_files();
            match (missing.first(), self.config.on_missing) {
                (None, _) => available.push(location),
                (Some(path), MissingQuarterPolicy::Abort) => {
                    return Err(LoadError::NotFound(path.clone()));
                }
                (Some(_), MissingQuarterPolicy::Skip) => {
                    log::warn!(
                        "Skipping quarter {}: missing {}",
                        location,
                        display_paths(&missing)
                    );
                    skipped.push(location);
                }
            }
        }
        Ok((available, skipped))
    }

    /// Accumulates one filing set over every quarter: a company's filings are
    /// spread across quarters.
    fn resolve_filings(
        &self,
        selection: &Selection,
        quarters: &[QuarterLocation],
    ) -> Result<FilingSet> {
        let forms = selection.form_codes();
        let mut filings = FilingSet::new();

        for quarter in quarters {
            self.progress.phase_started(quarter, Phase::ResolveFilings);
            let mut source = RecordSource::open(quarter.file(Table::Sub))?;
            let found = resolve::resolve_filings(&mut source, &selection.company, &forms)?;

            self.progress.phase_finished(
                quarter,
                Phase::ResolveFilings,
                &LoadStats {
                    matched: found.len() as u64,
                    malformed: source.malformed_rows(),
                    ..LoadStats::default()
                },
            );
            filings.extend(found);
        }
        Ok(filings)
    }

    async fn load_quarter(
        &self,
        quarter: &QuarterLocation,
        filings: &FilingSet,
    ) -> Result<QuarterSummary> {
        db::setup_tables(self.pool).await?;
        let loader =
            SelectiveLoader::new(self.pool, self.config.batch_size).with_progress(self.progress);
        let mut tables = BTreeMap::new();

        let by_filing = RowFilter::field_in("adsh", filings);
        for table in [Table::Sub, Table::Pre] {
            let stats = self.load_table(&loader, quarter, table, by_filing).await?;
            tables.insert(table, stats);
        }

        // Tag rows are not keyed by filing. Their keys come from this quarter's
        // presentation rows, so this step must follow the `pre` load above.
        let tag_versions = self.resolve_tag_versions(quarter, filings)?;
        let by_tag_version = RowFilter::pair_in("tag", "version", &tag_versions);
        let stats = self
            .load_table(&loader, quarter, Table::Tag, by_tag_version)
            .await?;
        tables.insert(Table::Tag, stats);

        let stats = self.load_table(&loader, quarter, Table::Num, by_filing).await?;
        tables.insert(Table::Num, stats);

        Ok(QuarterSummary {
            quarter: quarter.to_string(),
            tag_versions: tag_versions.len(),
            tables,
        })
    }

    fn resolve_tag_versions(
        &self,
        quarter: &QuarterLocation,
        filings: &FilingSet,
    ) -> Result<TagVersionSet> {
        self.progress.phase_started(quarter, Phase::ResolveTagVersions);
        let mut source = RecordSource::open(quarter.file(Table::Pre))?;
        let tag_versions = resolve::resolve_tag_versions(&mut source, filings)?;
        self.progress.phase_finished(
            quarter,
            Phase::ResolveTagVersions,
            &LoadStats {
                matched: tag_versions.len() as u64,
                malformed: source.malformed_rows(),
                ..LoadStats::default()
            },
        );
        Ok(tag_versions)
    }

    async fn load_table(
        &self,
        loader: &SelectiveLoader<'_>,
        quarter: &QuarterLocation,
        table: Table,
        filter: RowFilter<'_>,
    ) -> Result<LoadStats> {
        self.progress.phase_started(quarter, Phase::Load(table));
        let mut source = RecordSource::open(quarter.file(table))?;
        let keep = filter.bind(&source)?;
        let stats = loader.load(table, &mut source, &keep).await?;
        self.progress.phase_finished(quarter, Phase::Load(table), &stats);
        Ok(stats)
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
