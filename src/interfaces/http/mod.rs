use crate::application::UploadUseCase;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::db::datasets::DatasetRepository;
use crate::infrastructure::pdf::ReportRenderer;
use crate::infrastructure::storage::UploadStore;
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Responder};
use futures_util::TryStreamExt;
use serde_json::json;
use sqlx::sqlite::SqlitePool;
use tracing::error;

pub struct ApiState {
    pub upload: UploadUseCase,
    pub repo: DatasetRepository,
    pub renderer: ReportRenderer,
    pub retention_limit: i64,
}

impl ApiState {
    pub fn new(pool: SqlitePool, store: UploadStore, retention_limit: i64) -> Self {
        let repo = DatasetRepository::new(pool);
        Self {
            upload: UploadUseCase::new(repo.clone(), store, retention_limit),
            repo,
            renderer: ReportRenderer::new(),
            retention_limit,
        }
    }
}

/// Register the API routes under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(upload_csv)
            .service(get_dataset)
            .service(get_summary)
            .service(get_pdf)
            .service(get_history)
            .service(health_check),
    );
}

fn error_response(err: &AppError) -> HttpResponse {
    let body = json!({ "error": err.to_string() });
    match err {
        AppError::ValidationError(_) | AppError::ParseError(_) => {
            HttpResponse::BadRequest().json(body)
        }
        AppError::NotFound(_) => HttpResponse::NotFound().json(body),
        _ => {
            error!(error = %err, "Request failed");
            HttpResponse::InternalServerError().json(body)
        }
    }
}

/// Pull the `file` field out of the multipart body, draining any other
/// fields along the way.
async fn read_upload(payload: &mut Multipart) -> Result<Option<(String, Vec<u8>)>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::ParseError(format!("Malformed multipart body: {}", e)))?
    {
        let is_file = field.name() == Some("file");
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to read upload: {}", e)))?
        {
            bytes.extend_from_slice(&chunk);
        }

        if is_file && upload.is_none() {
            let filename = filename.ok_or_else(|| {
                AppError::ValidationError("Uploaded file has no filename".to_string())
            })?;
            upload = Some((filename, bytes));
        }
    }

    Ok(upload)
}

#[post("/upload")]
async fn upload_csv(data: web::Data<ApiState>, mut payload: Multipart) -> impl Responder {
    let (filename, bytes) = match read_upload(&mut payload).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            return HttpResponse::BadRequest().json(json!({ "error": "No file uploaded" }))
        }
        Err(e) => return error_response(&e),
    };

    match data.upload.execute(&filename, &bytes).await {
        Ok(dataset) => HttpResponse::Created().json(json!({
            "message": "File uploaded successfully",
            "data": dataset,
        })),
        Err(e) => error_response(&e),
    }
}

#[get("/datasets/{id}")]
async fn get_dataset(data: web::Data<ApiState>, path: web::Path<i64>) -> impl Responder {
    match data.repo.get(path.into_inner()).await {
        Ok(dataset) => HttpResponse::Ok().json(dataset),
        Err(e) => error_response(&e),
    }
}

#[get("/datasets/{id}/summary")]
async fn get_summary(path: web::Path<i64>) -> impl Responder {
    // Placeholder surface kept for the dashboard client
    HttpResponse::Ok().json(json!({
        "datasetId": path.into_inner(),
        "summary": "summary endpoint working",
    }))
}

#[get("/datasets/{id}/pdf")]
async fn get_pdf(data: web::Data<ApiState>, path: web::Path<i64>) -> impl Responder {
    let dataset_id = path.into_inner();

    let dataset = match data.repo.get(dataset_id).await {
        Ok(dataset) => dataset,
        Err(e) => return error_response(&e),
    };

    match data.renderer.render(&dataset) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"report_{}.pdf\"", dataset_id),
            ))
            .body(bytes),
        Err(e) => error_response(&e),
    }
}

#[get("/history")]
async fn get_history(data: web::Data<ApiState>) -> impl Responder {
    match data.repo.list_recent(data.retention_limit).await {
        Ok(datasets) => HttpResponse::Ok().json(json!({
            "count": datasets.len(),
            "datasets": datasets,
        })),
        Err(e) => error_response(&e),
    }
}

#[get("/health")]
async fn health_check(data: web::Data<ApiState>) -> impl Responder {
    match data.repo.count().await {
        Ok(count) => HttpResponse::Ok().json(json!({
            "status": "healthy",
            "datasets": count,
        })),
        Err(e) => error_response(&e),
    }
}
