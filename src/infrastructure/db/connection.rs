use crate::domain::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::str::FromStr;

/// Open the SQLite pool and create the schema if it does not exist.
/// Foreign keys are enabled so equipment rows cascade with their dataset.
pub async fn init_db(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::DatabaseError(format!("Failed to parse connection string: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(options)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS datasets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            upload_date DATETIME NOT NULL,
            total_count INTEGER NOT NULL,
            avg_flowrate REAL NOT NULL,
            avg_pressure REAL NOT NULL,
            avg_temperature REAL NOT NULL,
            type_distribution TEXT NOT NULL,
            file_path TEXT NOT NULL
        )",
    )
    .execute(&pool)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to create datasets table: {}", e)))?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS equipment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dataset_id INTEGER NOT NULL REFERENCES datasets(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            equipment_type TEXT NOT NULL,
            flowrate REAL NOT NULL,
            pressure REAL NOT NULL,
            temperature REAL NOT NULL
        )",
    )
    .execute(&pool)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to create equipment table: {}", e)))?;

    Ok(pool)
}
