use crate::core::errors::{LoadError, Result};
use crate::edgar::report::ReportType;
use chrono::Datelike;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;
use strum::{Display, EnumString};

/// The Financial Statement Data Sets start with 2009Q1.
pub const FIRST_DATASET_YEAR: i32 = 2009;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ResetMode {
    /// Keep existing rows; duplicates are ignored.
    #[default]
    Append,
    /// Drop all four tables before loading.
    #[strum(to_string = "wipe", serialize = "wipe-and-restart")]
    Wipe,
}

/// What the user asked to load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub company: String,
    pub years: BTreeSet<i32>,
    pub forms: BTreeSet<ReportType>,
    pub reset: ResetMode,
}

impl Selection {
    pub fn new(
        company: impl Into<String>,
        years: impl IntoIterator<Item = i32>,
        forms: impl IntoIterator<Item = ReportType>,
        reset: ResetMode,
    ) -> Self {
        Selection {
            company: company.into().trim().to_string(),
            years: years.into_iter().collect(),
            forms: forms.into_iter().collect(),
            reset,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.company.trim().is_empty() {
            return Err(LoadError::InvalidSelection(
                "a company name must be specified".to_string(),
            ));
        }
        if self.years.is_empty() {
            return Err(LoadError::InvalidSelection(
                "at least one year must be specified".to_string(),
            ));
        }
        if self.forms.is_empty() {
            return Err(LoadError::InvalidSelection(
                "at least one filing type must be specified".to_string(),
            ));
        }
        let current_year = chrono::Local::now().year();
        if let Some(year) = self
            .years
            .iter()
            .find(|y| **y < FIRST_DATASET_YEAR || **y > current_year)
        {
            return Err(LoadError::InvalidSelection(format!(
                "year {} is outside {}..={}",
                year, FIRST_DATASET_YEAR, current_year
            )));
        }
        Ok(())
    }

    /// Form codes exactly as they are matched against the `form` column.
    pub fn form_codes(&self) -> HashSet<String> {
        self.forms.iter().map(|f| f.to_string()).collect()
    }

    pub fn forms_label(&self) -> String {
        self.forms.iter().join(", ")
    }
}

/// Parses `2019, 2021-2022` into `{2019, 2021, 2022}`.
pub fn parse_years(input: &str) -> Result<BTreeSet<i32>> {
    let mut years = BTreeSet::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let parse = |s: &str| {
            i32::from_str(s.trim())
                .map_err(|_| LoadError::InvalidSelection(format!("not a year: '{}'", s.trim())))
        };
        match part.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse(start)?, parse(end)?);
                if start > end {
                    return Err(LoadError::InvalidSelection(format!(
                        "empty year range: '{}'",
                        part
                    )));
                }
                years.extend(start..=end);
            }
            None => {
                years.insert(parse(part)?);
            }
        }
    }
    Ok(years)
}

/// Parses a comma separated list of form codes.
pub fn parse_forms(input: &str) -> Result<BTreeSet<ReportType>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| ReportType::from_str(p).map_err(LoadError::InvalidSelection))
        .collect()
}
