use crate::core::errors::Result;
use crate::fsds::table::{quote_ident, Table};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Opens (creating if needed) the SQLite store. One connection: there is a single writer.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    log::debug!("Connected to {}", database_url);
    Ok(pool)
}

pub async fn setup_table(pool: &SqlitePool, table: Table) -> Result<()> {
    sqlx::query(&table.create_sql()).execute(pool).await?;
    log::debug!("Table {} ready", table);
    Ok(())
}

pub async fn setup_tables(pool: &SqlitePool) -> Result<()> {
    for table in Table::all() {
        setup_table(pool, table).await?;
    }
    Ok(())
}

pub async fn reset_table(pool: &SqlitePool, table: Table) -> Result<()> {
    sqlx::query(&table.drop_sql()).execute(pool).await?;
    log::info!("Dropped table {}", table);
    Ok(())
}

pub async fn reset_tables(pool: &SqlitePool) -> Result<()> {
    for table in Table::all() {
        reset_table(pool, table).await?;
    }
    Ok(())
}

pub async fn table_exists(pool: &SqlitePool, table: Table) -> Result<bool> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table.name())
            .fetch_one(pool)
            .await?;
    Ok(row.0 > 0)
}

/// Row count, or 0 when the table has not been created.
pub async fn count_rows(pool: &SqlitePool, table: Table) -> Result<i64> {
    if !table_exists(pool, table).await? {
        return Ok(0);
    }
    let query_str = format!("SELECT COUNT(*) FROM {}", quote_ident(table.name()));
    let row: (i64,) = sqlx::query_as(&query_str).fetch_one(pool).await?;
    Ok(row.0)
}
