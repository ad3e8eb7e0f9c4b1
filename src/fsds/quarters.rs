use super::table::Table;
use crate::edgar::report::ReportType;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// One `(year, fiscal quarter)` directory of the data sets, e.g. `data/fsds/2020Q1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct QuarterLocation {
    pub year: i32,
    pub quarter: u8,
    pub dir: PathBuf,
}

impl QuarterLocation {
    pub fn new(root: &Path, year: i32, quarter: u8) -> Self {
        Self {
            year,
            quarter,
            dir: root.join(format!("{}Q{}", year, quarter)),
        }
    }

    pub fn file(&self, table: Table) -> PathBuf {
        self.dir.join(table.file_name())
    }

    /// Source files of the four tables that are not present.
    pub fn missing_files(&self) -> Vec<PathBuf> {
        Table::all()
            .map(|t| self.file(t))
            .filter(|p| !p.is_file())
            .collect()
    }
}

impl fmt::Display for QuarterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

/// Quarter directories to scan, ascending by year then quarter.
///
/// Annual reports only appear in the first quarter of each year, so a selection
/// of exactly `{10-K}` visits one quarter per year; anything else visits all four.
pub fn quarter_locations(
    root: &Path,
    years: &BTreeSet<i32>,
    forms: &BTreeSet<ReportType>,
) -> Vec<QuarterLocation> {
    let annual_only = !forms.is_empty() && forms.iter().all(ReportType::is_annual);
    let quarters: &[u8] = if annual_only { &[1] } else { &[1, 2, 3, 4] };

    years
        .iter()
        .flat_map(|year| quarters.iter().map(move |q| QuarterLocation::new(root, *year, *q)))
        .collect()
}
