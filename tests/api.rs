use actix_web::{test, web, App};
use equipflow::infrastructure::db::connection::init_db;
use equipflow::infrastructure::db::datasets::DatasetRepository;
use equipflow::infrastructure::storage::UploadStore;
use equipflow::interfaces::http::{configure, ApiState};
use serde_json::Value;
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

const BOUNDARY: &str = "------------------------equipflowtest";

const VALID_CSV: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
                         Pump1,Pump,10.0,5.0,20.0\n\
                         Valve1,Valve,20.0,15.0,25.0\n";

struct TestApp {
    state: web::Data<ApiState>,
    pool: SqlitePool,
    _dir: TempDir,
}

async fn setup() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("api.db").display());
    let pool = init_db(&url).await.unwrap();
    let store = UploadStore::new(dir.path().join("uploads"));
    let state = web::Data::new(ApiState::new(pool.clone(), store, 5));

    TestApp {
        state,
        pool,
        _dir: dir,
    }
}

fn upload_request(filename: &str, content: &str) -> test::TestRequest {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
         Content-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = filename,
        c = content
    );

    test::TestRequest::post()
        .uri("/api/upload")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
}

macro_rules! init_app {
    ($test_app:expr) => {
        test::init_service(
            App::new()
                .app_data($test_app.state.clone())
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn upload_valid_csv_returns_stored_dataset() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let resp = test::call_service(&app, upload_request("plant.csv", VALID_CSV).to_request()).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    let data = &body["data"];

    assert_eq!(data["filename"], "plant.csv");
    assert_eq!(data["totalCount"], 2);
    assert_eq!(data["averages"]["flowrate"], 15.0);
    assert_eq!(data["averages"]["pressure"], 10.0);
    assert_eq!(data["averages"]["temperature"], 22.5);
    assert_eq!(data["typeDistribution"]["Pump"], 1);
    assert_eq!(data["typeDistribution"]["Valve"], 1);

    let equipment = data["equipmentList"].as_array().unwrap();
    assert_eq!(equipment.len(), 2);
    assert_eq!(equipment[0]["name"], "Pump1");
    assert_eq!(equipment[0]["type"], "Pump");
}

#[actix_web::test]
async fn upload_missing_columns_names_every_missing_column() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let csv = "Equipment Name,Flowrate\nPump1,10.0\n";
    let resp = test::call_service(&app, upload_request("plant.csv", csv).to_request()).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Type"));
    assert!(message.contains("Pressure"));
    assert!(message.contains("Temperature"));

    // Nothing was stored
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
        .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["datasets"], 0);
}

#[actix_web::test]
async fn upload_non_csv_filename_is_rejected() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let resp = test::call_service(&app, upload_request("data.txt", VALID_CSV).to_request()).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("CSV"));
}

#[actix_web::test]
async fn upload_without_file_field_is_rejected() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let req = test::TestRequest::post()
        .uri("/api/upload")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No file uploaded");
}

#[actix_web::test]
async fn upload_empty_csv_is_rejected() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let csv = "Equipment Name,Type,Flowrate,Pressure,Temperature\n";
    let resp = test::call_service(&app, upload_request("plant.csv", csv).to_request()).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("no data rows"));
}

#[actix_web::test]
async fn upload_non_numeric_measurement_is_rejected() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let csv = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
               Pump1,Pump,not-a-number,5.0,20.0\n";
    let resp = test::call_service(&app, upload_request("plant.csv", csv).to_request()).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Flowrate"));
    assert!(message.contains("row 1"));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
        .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["datasets"], 0);
}

#[actix_web::test]
async fn upload_non_finite_measurement_is_rejected() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    for value in ["inf", "NaN"] {
        let csv = format!(
            "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
             Pump1,Pump,{},5.0,20.0\n",
            value
        );
        let resp =
            test::call_service(&app, upload_request("plant.csv", &csv).to_request()).await;
        assert_eq!(resp.status(), 400, "value {}", value);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("Flowrate"));
    }

    // Neither upload left anything behind
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
        .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["datasets"], 0);
}

#[actix_web::test]
async fn get_dataset_returns_404_for_unknown_id() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let req = test::TestRequest::get()
        .uri("/api/datasets/42")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn get_dataset_round_trips_averages() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let resp = test::call_service(&app, upload_request("plant.csv", VALID_CSV).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/datasets/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let dataset: Value = test::read_body_json(resp).await;
    let equipment = dataset["equipmentList"].as_array().unwrap();
    let n = equipment.len() as f64;
    let flow: f64 = equipment
        .iter()
        .map(|e| e["flowrate"].as_f64().unwrap())
        .sum();

    let stored = dataset["averages"]["flowrate"].as_f64().unwrap();
    assert!((flow / n - stored).abs() < 1e-9);
}

#[actix_web::test]
async fn summary_endpoint_echoes_id() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let req = test::TestRequest::get()
        .uri("/api/datasets/7/summary")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["datasetId"], 7);
}

#[actix_web::test]
async fn pdf_endpoint_serves_report_attachment() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let resp = test::call_service(&app, upload_request("plant.csv", VALID_CSV).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/datasets/{}/pdf", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    assert!(resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains(&format!("report_{}.pdf", id)));

    let bytes = test::read_body(resp).await;
    assert!(bytes.starts_with(b"%PDF"));
}

#[actix_web::test]
async fn pdf_endpoint_404_for_unknown_dataset() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let req = test::TestRequest::get()
        .uri("/api/datasets/99/pdf")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn history_keeps_only_five_most_recent_uploads() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let mut first_id = None;
    for i in 0..6 {
        let resp = test::call_service(
            &app,
            upload_request(&format!("plant{}.csv", i), VALID_CSV).to_request(),
        )
        .await;
        assert_eq!(resp.status(), 201);

        let body: Value = test::read_body_json(resp).await;
        let id = body["data"]["id"].as_i64().unwrap();
        if first_id.is_none() {
            // Capture the retained file path while the dataset still exists
            let repo = DatasetRepository::new(test_app.pool.clone());
            let dataset = repo.get(id).await.unwrap();
            first_id = Some((id, dataset.file_path));
        }
    }

    let (first_id, first_file) = first_id.unwrap();

    let req = test::TestRequest::get().uri("/api/history").to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["count"], 5);
    assert_eq!(body["datasets"].as_array().unwrap().len(), 5);

    // Newest first, and the evicted dataset is not listed
    let listed_ids: Vec<i64> = body["datasets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect();
    assert!(!listed_ids.contains(&first_id));
    assert!(listed_ids.windows(2).all(|w| w[0] > w[1]));

    // Record gone
    let req = test::TestRequest::get()
        .uri(&format!("/api/datasets/{}", first_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // Backing file gone
    assert!(!std::path::Path::new(&first_file).exists());

    // No orphaned equipment rows
    let orphans: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM equipment WHERE dataset_id NOT IN (SELECT id FROM datasets)",
    )
    .fetch_one(&test_app.pool)
    .await
    .unwrap();
    assert_eq!(orphans, 0);
}

#[actix_web::test]
async fn health_reports_dataset_count() {
    let test_app = setup().await;
    let app = init_app!(test_app);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["datasets"], 0);

    test::call_service(&app, upload_request("plant.csv", VALID_CSV).to_request()).await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["datasets"], 1);
}
