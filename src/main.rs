use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use equipflow::infrastructure::config::AppConfig;
use equipflow::infrastructure::db::connection::init_db;
use equipflow::infrastructure::storage::UploadStore;
use equipflow::interfaces::http::{configure, ApiState};
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .try_init();

    let config = AppConfig::load().map_err(to_io_err)?;

    let pool = init_db(&config.database_url).await.map_err(to_io_err)?;

    let store = UploadStore::new(&config.media_root);
    store.ensure_root().map_err(to_io_err)?;

    let state = web::Data::new(ApiState::new(pool, store, config.retention_limit));

    info!(host = %config.host, port = config.port, "Starting equipflow backend");

    HttpServer::new(move || {
        let cors = Cors::permissive(); // Local dashboard tool, any origin is fine

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

fn to_io_err(err: equipflow::domain::error::AppError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}
