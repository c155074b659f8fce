use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use datalab::api::{router, AppState};
use datalab::{AppConfig, FileStore};

const SAMPLE_CSV: &str = "a,b,city\n1,10,Paris\n2,20,Rome\n,30,Oslo\n4,40,\n5,1000,Rome\n";

fn setup() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store.save("data.csv", SAMPLE_CSV.as_bytes()).unwrap();

    let config = AppConfig {
        upload_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    (dir, router(AppState::new(store, config)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    send(app, request).await
}

fn multipart_request(field: &str, filename: &str, content: &str) -> Request<Body> {
    let boundary = "datalab-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n{content}\r\n--{boundary}--\r\n"
    );
    Request::post("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_and_root() {
    let (_dir, app) = setup();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, body) = get(&app, "/").await;
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn upload_then_list() {
    let (_dir, app) = setup();

    let (status, body) = send(&app, multipart_request("file", "new.csv", "x,y\n1,2\n")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["filename"], "new.csv");

    let (_, body) = get(&app, "/api/files").await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["filename"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["data.csv", "new.csv"]);
}

#[tokio::test]
async fn upload_rejects_bad_input() {
    let (_dir, app) = setup();

    let (status, body) = send(&app, multipart_request("file", "notes.txt", "hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "invalid_argument");

    let (status, _) = send(&app, multipart_request("file", "", "x\n1\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, multipart_request("other", "a.csv", "x\n1\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);
}

#[tokio::test]
async fn preview_reports_structure() {
    let (_dir, app) = setup();
    let (status, body) = get(&app, "/api/preview/data.csv").await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["rows"], 5);
    assert_eq!(data["columns"], 3);
    assert_eq!(data["column_names"], json!(["a", "b", "city"]));
    assert_eq!(data["dtypes"]["a"], "numeric");
    assert_eq!(data["dtypes"]["city"], "text");
    assert_eq!(data["missing_values"]["a"], 1);
    assert_eq!(data["missing_values"]["city"], 1);
    assert_eq!(data["preview"].as_array().unwrap().len(), 5);
    assert!(data["preview"][2]["a"].is_null());
}

#[tokio::test]
async fn preview_reads_excel_workbook() {
    use rust_xlsxwriter::Workbook;

    let (dir, app) = setup();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "month").unwrap();
    sheet.write_string(0, 1, "sales").unwrap();
    for (row, (month, sales)) in [("jan", 10.0), ("feb", 12.5), ("mar", 9.0)].into_iter().enumerate() {
        sheet.write_string(row as u32 + 1, 0, month).unwrap();
        sheet.write_number(row as u32 + 1, 1, sales).unwrap();
    }
    workbook.save(dir.path().join("sales.xlsx")).unwrap();

    let (status, body) = get(&app, "/api/preview/sales.xlsx").await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["rows"], 3);
    assert_eq!(data["dtypes"]["month"], "text");
    assert_eq!(data["dtypes"]["sales"], "numeric");
    assert_eq!(data["preview"][1]["sales"], 12.5);
}

#[tokio::test]
async fn preview_missing_file_is_404() {
    let (_dir, app) = setup();
    let (status, body) = get(&app, "/api/preview/absent.csv").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "not_found");
}

#[tokio::test]
async fn missing_values_mean_and_save() {
    let (dir, app) = setup();
    let (status, body) = post_json(
        &app,
        "/api/clean/missing",
        json!({ "filename": "data.csv", "strategy": "mean", "save_as": "clean.csv" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["saved_as"], "clean.csv");
    assert_eq!(data["table"]["missing_values"]["a"], 0);
    assert_eq!(data["table"]["preview"][2]["a"], 3.0);
    assert!(dir.path().join("clean.csv").is_file());
}

#[tokio::test]
async fn missing_values_errors() {
    let (_dir, app) = setup();
    let (status, _) = post_json(
        &app,
        "/api/clean/missing",
        json!({ "filename": "data.csv", "strategy": "interpolate" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &app,
        "/api/clean/missing",
        json!({ "filename": "data.csv", "strategy": "value" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("fill_value"));

    let (status, body) = post_json(&app, "/api/clean/missing", json!({ "strategy": "mean" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn outliers_detect_and_remove() {
    let (_dir, app) = setup();
    let (status, body) = post_json(
        &app,
        "/api/clean/outliers/detect",
        json!({ "filename": "data.csv", "method": "iqr", "columns": ["b"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outliers"]["b"], json!([4]));
    assert_eq!(body["data"]["total_outlier_rows"], 1);

    let (status, body) = post_json(
        &app,
        "/api/clean/outliers/remove",
        json!({ "filename": "data.csv", "method": "iqr", "columns": ["b"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["summary"]["removed_rows"], 1);
    assert_eq!(body["data"]["table"]["rows"], 4);
}

#[tokio::test]
async fn normalize_minmax() {
    let (_dir, app) = setup();
    let (status, body) = post_json(
        &app,
        "/api/clean/normalize",
        json!({ "filename": "data.csv", "method": "minmax", "columns": ["a"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let preview = &body["data"]["table"]["preview"];
    assert_eq!(preview[0]["a"], 0.0);
    assert_eq!(preview[4]["a"], 1.0);
    assert_eq!(preview[0]["b"], 10.0);

    let (status, _) = post_json(
        &app,
        "/api/clean/normalize",
        json!({ "filename": "data.csv", "method": "log" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn regression_endpoint() {
    let (dir, app) = setup();
    let rows: String = (0..20).map(|i| format!("{i},{}\n", 2 * i + 3)).collect();
    std::fs::write(dir.path().join("line.csv"), format!("feature1,target\n{rows}")).unwrap();

    let (status, body) = post_json(
        &app,
        "/api/analysis/regression",
        json!({ "filename": "line.csv", "features": ["feature1"], "target": "target" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert!((data["coefficients"]["feature1"].as_f64().unwrap() - 2.0).abs() < 1e-6);
    assert!((data["intercept"].as_f64().unwrap() - 3.0).abs() < 1e-6);
    assert!((data["metrics"]["train_r2"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(data["plot_data"][0]["feature"], "feature1");

    let (status, _) = post_json(
        &app,
        "/api/analysis/regression",
        json!({ "filename": "line.csv", "features": ["nope"], "target": "target" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn line_chart_endpoint() {
    let (_dir, app) = setup();
    let (status, body) = post_json(
        &app,
        "/api/visualize/line",
        json!({ "filename": "data.csv", "x_column": "city", "y_columns": ["a", "b"], "title": "Demo" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["title"], "Demo");
    assert_eq!(data["xaxis_title"], "X Axis");
    assert_eq!(data["series"].as_array().unwrap().len(), 2);
    assert_eq!(data["series"][1]["y"][4], 1000.0);

    let (status, _) = post_json(
        &app,
        "/api/visualize/line",
        json!({ "filename": "data.csv", "x_column": "city", "y_columns": ["zzz"] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &app,
        "/api/visualize/line",
        json!({ "filename": "gone.csv", "x_column": "a", "y_columns": ["b"] }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scatter_chart_endpoint() {
    let (_dir, app) = setup();
    let (status, body) = post_json(
        &app,
        "/api/visualize/scatter",
        json!({ "filename": "data.csv", "x_column": "a", "y_column": "b" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["kind"], "scatter");
    assert_eq!(body["data"]["series"][0]["mode"], "markers");
}
