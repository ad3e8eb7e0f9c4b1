use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use strum::{EnumIter, IntoEnumIterator};

/// Filing type as it appears in the `form` column of `sub.txt`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
#[serde(try_from = "String", into = "String")]
pub enum ReportType {
    Form10K,
    Form10KA,
    Form10KT,
    Form10Q,
    Form10QA,
    Form8K,
    Form20F,
    Form40F,
    Form6K,
    FormS1,
    FormS4,
    FormDEF14A,
    Other(String),
}

impl TryFrom<String> for ReportType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ReportType::from_str(&s)
    }
}

impl From<ReportType> for String {
    fn from(report_type: ReportType) -> Self {
        report_type.to_string()
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Form10K => write!(f, "10-K"),
            ReportType::Form10KA => write!(f, "10-K/A"),
            ReportType::Form10KT => write!(f, "10-KT"),
            ReportType::Form10Q => write!(f, "10-Q"),
            ReportType::Form10QA => write!(f, "10-Q/A"),
            ReportType::Form8K => write!(f, "8-K"),
            ReportType::Form20F => write!(f, "20-F"),
            ReportType::Form40F => write!(f, "40-F"),
            ReportType::Form6K => write!(f, "6-K"),
            ReportType::FormS1 => write!(f, "S-1"),
            ReportType::FormS4 => write!(f, "S-4"),
            ReportType::FormDEF14A => write!(f, "DEF 14A"),
            ReportType::Other(s) => write!(f, "{}", s),
        }
    }
}

pub static REPORT_TYPES: Lazy<Vec<String>> = Lazy::new(|| {
    ReportType::iter()
        .filter(|t| !matches!(t, ReportType::Other(_)))
        .map(|t| t.to_string())
        .collect()
});

impl ReportType {
    pub fn list_types() -> &'static [String] {
        &REPORT_TYPES
    }

    /// Annual reports are published once a year, in the first fiscal quarter's dataset.
    pub fn is_annual(&self) -> bool {
        matches!(self, ReportType::Form10K)
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<ReportType, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Filing type cannot be empty".to_string());
        }
        match s.to_uppercase().as_str() {
            "10-K" => Ok(ReportType::Form10K),
            "10-K/A" => Ok(ReportType::Form10KA),
            "10-KT" => Ok(ReportType::Form10KT),
            "10-Q" => Ok(ReportType::Form10Q),
            "10-Q/A" => Ok(ReportType::Form10QA),
            "8-K" => Ok(ReportType::Form8K),
            "20-F" => Ok(ReportType::Form20F),
            "40-F" => Ok(ReportType::Form40F),
            "6-K" => Ok(ReportType::Form6K),
            "S-1" => Ok(ReportType::FormS1),
            "S-4" => Ok(ReportType::FormS4),
            "DEF 14A" => Ok(ReportType::FormDEF14A),
            _ => Ok(ReportType::Other(s.to_string())),
        }
    }
}
