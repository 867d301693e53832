use crate::domain::error::Result;
use crate::infrastructure::db::datasets::DatasetRepository;
use crate::infrastructure::storage::UploadStore;
use tracing::{info, warn};

/// Drop datasets that fell outside the most-recent-`limit` window: backing
/// files first (missing files are fine), then the rows in one transaction.
///
/// Runs only after the new dataset is durably stored, and never removes
/// `protect_id` even if timestamps collide.
pub async fn enforce_retention(
    repo: &DatasetRepository,
    store: &UploadStore,
    limit: i64,
    protect_id: i64,
) -> Result<usize> {
    let victims: Vec<(i64, String)> = repo
        .excess_oldest(limit)
        .await?
        .into_iter()
        .filter(|(id, _)| *id != protect_id)
        .collect();

    if victims.is_empty() {
        return Ok(0);
    }

    for (id, file_path) in &victims {
        if let Err(e) = store.remove(file_path) {
            // File removal failures do not block the sweep
            warn!(dataset_id = id, error = %e, "Failed to remove retained upload file");
        }
    }

    let ids: Vec<i64> = victims.iter().map(|(id, _)| *id).collect();
    repo.delete_many(&ids).await?;

    info!(pruned = victims.len(), limit, "Retention sweep removed old datasets");
    Ok(victims.len())
}
