use crate::application::use_cases::{aggregation, retention, validation};
use crate::domain::dataset::Dataset;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::csv::CsvParser;
use crate::infrastructure::db::datasets::DatasetRepository;
use crate::infrastructure::storage::UploadStore;
use chrono::Utc;
use tracing::info;

/// The upload pipeline: parse, validate, aggregate, persist, retain.
///
/// All input errors are raised before anything is written; the database
/// write is a single transaction, so a failed upload leaves no trace.
pub struct UploadUseCase {
    repo: DatasetRepository,
    store: UploadStore,
    parser: CsvParser,
    retention_limit: i64,
}

impl UploadUseCase {
    pub fn new(repo: DatasetRepository, store: UploadStore, retention_limit: i64) -> Self {
        Self {
            repo,
            store,
            parser: CsvParser::new(),
            retention_limit,
        }
    }

    pub async fn execute(&self, filename: &str, bytes: &[u8]) -> Result<Dataset> {
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(AppError::ValidationError(
                "File must be CSV format".to_string(),
            ));
        }

        let table = self.parser.parse_bytes(bytes)?;
        validation::validate_table(&table)?;
        let records = validation::to_records(&table)?;
        let summary = aggregation::summarize(&records);

        let upload_date = Utc::now();
        let file_path = self.store.save(filename, bytes, upload_date)?;
        let file_path_str = file_path.to_string_lossy().to_string();

        let dataset_id = match self
            .repo
            .create(filename, upload_date, &file_path_str, &summary, &records)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                // The transaction rolled back; drop the orphaned file too
                let _ = self.store.remove(&file_path_str);
                return Err(e);
            }
        };

        info!(
            dataset_id,
            filename = %filename,
            rows = summary.total_count,
            "Stored upload"
        );

        retention::enforce_retention(&self.repo, &self.store, self.retention_limit, dataset_id)
            .await?;

        self.repo.get(dataset_id).await
    }
}
