use anyhow::Result;
use std::fs;
use std::path::Path;

// Unpacked Financial Statement Data Sets, one directory per quarter
pub const FSDS_DATA_DIR: &str = "data/fsds";

pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Creates the directory holding a `sqlite://` database file so the store can be created.
pub fn ensure_database_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}
