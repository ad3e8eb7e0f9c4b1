use std::path::PathBuf;

/// Failures raised while resolving and loading a dataset selection.
///
/// Duplicate primary keys are not errors: `INSERT OR IGNORE` absorbs them and
/// they only show up as `LoadStats::ignored`.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("source file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{}:{line}: expected {expected} fields, found {found}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("no filings found for '{company}' with forms [{forms}]")]
    EmptySelection { company: String, forms: String },

    #[error("column '{column}' missing from header of {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("column '{column}' is not part of table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;
