use crate::domain::dataset::{Averages, Dataset, DatasetSummary, Equipment, EquipmentRecord};
use crate::domain::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use std::collections::BTreeMap;

/// Repository over the datasets/equipment tables. A dataset and its child
/// equipment rows are always written and deleted together.
#[derive(Clone)]
pub struct DatasetRepository {
    pool: SqlitePool,
}

impl DatasetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist one upload atomically: the dataset row and every equipment
    /// row commit together or not at all.
    pub async fn create(
        &self,
        filename: &str,
        upload_date: DateTime<Utc>,
        file_path: &str,
        summary: &DatasetSummary,
        records: &[EquipmentRecord],
    ) -> Result<i64> {
        let distribution = serde_json::to_string(&summary.type_distribution)
            .map_err(|e| AppError::Internal(format!("Failed to encode distribution: {}", e)))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        let result = sqlx::query(
            "INSERT INTO datasets (filename, upload_date, total_count, avg_flowrate, \
             avg_pressure, avg_temperature, type_distribution, file_path) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(filename)
        .bind(upload_date)
        .bind(summary.total_count)
        .bind(summary.averages.flowrate)
        .bind(summary.averages.pressure)
        .bind(summary.averages.temperature)
        .bind(&distribution)
        .bind(file_path)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert dataset: {}", e)))?;

        let dataset_id = result.last_insert_rowid();

        for record in records {
            sqlx::query(
                "INSERT INTO equipment (dataset_id, name, equipment_type, flowrate, pressure, temperature) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(dataset_id)
            .bind(&record.name)
            .bind(&record.equipment_type)
            .bind(record.flowrate)
            .bind(record.pressure)
            .bind(record.temperature)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to insert equipment: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit upload: {}", e)))?;

        Ok(dataset_id)
    }

    /// Fetch one dataset with its equipment rows.
    pub async fn get(&self, dataset_id: i64) -> Result<Dataset> {
        let row = sqlx::query_as::<_, DatasetEntity>(
            "SELECT id, filename, upload_date, total_count, avg_flowrate, avg_pressure, \
             avg_temperature, type_distribution, file_path FROM datasets WHERE id = ?",
        )
        .bind(dataset_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch dataset: {}", e)))?;

        let entity = row.ok_or_else(|| {
            AppError::NotFound(format!("Dataset not found: {}", dataset_id))
        })?;

        let equipment = self.equipment_for(dataset_id).await?;
        entity.into_dataset(equipment)
    }

    /// Most recent datasets (with children), newest first. Ties on
    /// upload_date break by id so ordering stays stable.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Dataset>> {
        let rows = sqlx::query_as::<_, DatasetEntity>(
            "SELECT id, filename, upload_date, total_count, avg_flowrate, avg_pressure, \
             avg_temperature, type_distribution, file_path FROM datasets \
             ORDER BY upload_date DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list datasets: {}", e)))?;

        let mut datasets = Vec::with_capacity(rows.len());
        for entity in rows {
            let equipment = self.equipment_for(entity.id).await?;
            datasets.push(entity.into_dataset(equipment)?);
        }

        Ok(datasets)
    }

    /// Number of stored datasets.
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM datasets")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count datasets: {}", e)))
    }

    /// Datasets falling outside the newest-`keep` window, oldest last in
    /// scan order. Returns (id, file_path) pairs for the retention sweep.
    pub async fn excess_oldest(&self, keep: i64) -> Result<Vec<(i64, String)>> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, file_path FROM datasets ORDER BY upload_date DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to scan datasets: {}", e)))?;

        Ok(rows.into_iter().skip(keep.max(0) as usize).collect())
    }

    /// Delete the given datasets in a single transaction. Equipment rows
    /// cascade via the foreign key.
    pub async fn delete_many(&self, dataset_ids: &[i64]) -> Result<u64> {
        if dataset_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        let mut deleted = 0;
        for id in dataset_ids {
            let result = sqlx::query("DELETE FROM datasets WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to delete dataset: {}", e)))?;
            deleted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit deletion: {}", e)))?;

        Ok(deleted)
    }

    async fn equipment_for(&self, dataset_id: i64) -> Result<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, EquipmentEntity>(
            "SELECT id, name, equipment_type, flowrate, pressure, temperature \
             FROM equipment WHERE dataset_id = ? ORDER BY id",
        )
        .bind(dataset_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch equipment: {}", e)))?;

        Ok(rows.into_iter().map(Equipment::from).collect())
    }
}

// Internal entities for database mapping

#[derive(sqlx::FromRow)]
struct DatasetEntity {
    id: i64,
    filename: String,
    upload_date: DateTime<Utc>,
    total_count: i64,
    avg_flowrate: f64,
    avg_pressure: f64,
    avg_temperature: f64,
    type_distribution: String,
    file_path: String,
}

impl DatasetEntity {
    fn into_dataset(self, equipment_list: Vec<Equipment>) -> Result<Dataset> {
        let type_distribution: BTreeMap<String, i64> =
            serde_json::from_str(&self.type_distribution).map_err(|e| {
                AppError::Internal(format!("Corrupt type distribution for dataset {}: {}", self.id, e))
            })?;

        Ok(Dataset {
            id: self.id,
            filename: self.filename,
            upload_date: self.upload_date,
            total_count: self.total_count,
            averages: Averages {
                flowrate: self.avg_flowrate,
                pressure: self.avg_pressure,
                temperature: self.avg_temperature,
            },
            type_distribution,
            file_path: self.file_path,
            equipment_list,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EquipmentEntity {
    id: i64,
    name: String,
    equipment_type: String,
    flowrate: f64,
    pressure: f64,
    temperature: f64,
}

impl From<EquipmentEntity> for Equipment {
    fn from(e: EquipmentEntity) -> Self {
        Self {
            id: e.id,
            name: e.name,
            equipment_type: e.equipment_type,
            flowrate: e.flowrate,
            pressure: e.pressure,
            temperature: e.temperature,
        }
    }
}
