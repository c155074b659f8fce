//! Обработчики запросов: разбор входа, загрузка таблицы, вызов обработки, JSON-ответ

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, Path, State},
    response::Json,
};
use chrono::Utc;

use super::{ApiError, AppState};
use crate::data::Table;
use crate::error::DataError;
use crate::models::regression;
use crate::preprocessing::{self, MissingStrategy, NormalizeMethod, OutlierMethod};
use crate::storage::{FileStore, StoredFile};
use crate::types::{
    ApiResponse, CleanOutput, LineChartRequest, MissingValuesRequest, NormalizeRequest,
    OutlierDetectOutput, OutlierRemoveOutput, OutlierRequest, RegressionRequest,
    ScatterChartRequest, TablePreview, UploadOutput,
};
use crate::visualization::{self, ChartSpec};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Ошибки разбора JSON тоже отдаются в общем формате
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| DataError::invalid(e.body_text()).into())
}

fn multipart_error(err: MultipartError) -> ApiError {
    DataError::invalid(format!("malformed upload: {err}")).into()
}

/// Чтение файлов и вычисления выполняются вне async-потоков рантайма
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, DataError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DataError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
        .map_err(ApiError::from)
}

/// Сохраняет таблицу, если клиент передал `save_as`
fn save_if_requested(
    state: &AppState,
    save_as: Option<&str>,
    table: &Table,
) -> Result<Option<String>, DataError> {
    save_as.map(|name| state.store.save_table(name, table)).transpose()
}

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "datalab API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<UploadOutput> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = FileStore::sanitize(field.file_name().unwrap_or(""))?;
        let bytes = field.bytes().await.map_err(multipart_error)?;
        tracing::info!("Upload request: {} ({} bytes)", filename, bytes.len());

        let stored = state.store.save(&filename, &bytes)?;
        return ok(UploadOutput {
            filename: stored,
            size: bytes.len(),
            uploaded_at: Utc::now(),
        });
    }

    Err(DataError::invalid("no file part in the request").into())
}

pub async fn list_files(State(state): State<AppState>) -> ApiResult<Vec<StoredFile>> {
    let files = state.store.list()?;
    tracing::info!("Listing {} stored files", files.len());
    ok(files)
}

pub async fn preview(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<TablePreview> {
    tracing::info!("Preview request: {}", filename);
    let preview = blocking(move || {
        let table = state.store.load_table(&filename)?;
        Ok(TablePreview::from_table(&table, state.config.preview_rows))
    })
    .await?;
    ok(preview)
}

pub async fn clean_missing(
    State(state): State<AppState>,
    payload: Result<Json<MissingValuesRequest>, JsonRejection>,
) -> ApiResult<CleanOutput> {
    let req = body(payload)?;
    tracing::info!("Missing values request: {} strategy={}", req.filename, req.strategy);

    let strategy = MissingStrategy::from_name(&req.strategy, req.fill_value)?;
    let output = blocking(move || {
        let table = state.store.load_table(&req.filename)?;
        let cleaned =
            preprocessing::handle_missing_values(&table, &strategy, req.columns.as_deref())?;

        Ok(CleanOutput {
            saved_as: save_if_requested(&state, req.save_as.as_deref(), &cleaned)?,
            table: TablePreview::from_table(&cleaned, state.config.preview_rows),
        })
    })
    .await?;
    ok(output)
}

pub async fn detect_outliers(
    State(state): State<AppState>,
    payload: Result<Json<OutlierRequest>, JsonRejection>,
) -> ApiResult<OutlierDetectOutput> {
    let req = body(payload)?;
    tracing::info!("Detect outliers request: {} method={}", req.filename, req.method);

    let method = OutlierMethod::from_name(&req.method, req.threshold)?;
    let outliers = blocking(move || {
        let table = state.store.load_table(&req.filename)?;
        preprocessing::detect_outliers(&table, method, req.columns.as_deref())
    })
    .await?;

    let total_outlier_rows = outliers
        .values()
        .flatten()
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    ok(OutlierDetectOutput {
        method: method.name().to_string(),
        outliers,
        total_outlier_rows,
    })
}

pub async fn remove_outliers(
    State(state): State<AppState>,
    payload: Result<Json<OutlierRequest>, JsonRejection>,
) -> ApiResult<OutlierRemoveOutput> {
    let req = body(payload)?;
    tracing::info!("Remove outliers request: {} method={}", req.filename, req.method);

    let method = OutlierMethod::from_name(&req.method, req.threshold)?;
    let output = blocking(move || {
        let table = state.store.load_table(&req.filename)?;
        let outliers = preprocessing::detect_outliers(&table, method, req.columns.as_deref())?;
        let (cleaned, summary) = preprocessing::remove_outliers(&table, &outliers)?;

        Ok(OutlierRemoveOutput {
            method: method.name().to_string(),
            outliers,
            summary,
            saved_as: save_if_requested(&state, req.save_as.as_deref(), &cleaned)?,
            table: TablePreview::from_table(&cleaned, state.config.preview_rows),
        })
    })
    .await?;
    ok(output)
}

pub async fn normalize(
    State(state): State<AppState>,
    payload: Result<Json<NormalizeRequest>, JsonRejection>,
) -> ApiResult<CleanOutput> {
    let req = body(payload)?;
    tracing::info!("Normalize request: {} method={}", req.filename, req.method);

    let method: NormalizeMethod = req.method.parse()?;
    let output = blocking(move || {
        let table = state.store.load_table(&req.filename)?;
        let normalized = preprocessing::normalize_data(&table, method, req.columns.as_deref())?;

        Ok(CleanOutput {
            saved_as: save_if_requested(&state, req.save_as.as_deref(), &normalized)?,
            table: TablePreview::from_table(&normalized, state.config.preview_rows),
        })
    })
    .await?;
    ok(output)
}

pub async fn fit_regression(
    State(state): State<AppState>,
    payload: Result<Json<RegressionRequest>, JsonRejection>,
) -> ApiResult<regression::RegressionResult> {
    let req = body(payload)?;
    tracing::info!(
        "Regression request: {} target={} features={:?}",
        req.filename,
        req.target,
        req.features
    );

    let result = blocking(move || {
        let table = state.store.load_table(&req.filename)?;
        regression::linear_regression(
            &table,
            &req.features,
            &req.target,
            req.test_size,
            req.random_state,
        )
    })
    .await?;
    ok(result)
}

pub async fn line_chart(
    State(state): State<AppState>,
    payload: Result<Json<LineChartRequest>, JsonRejection>,
) -> ApiResult<ChartSpec> {
    let req = body(payload)?;
    tracing::info!("Line chart request: {} x={} y={:?}", req.filename, req.x_column, req.y_columns);

    let chart = blocking(move || {
        let table = state.store.load_table(&req.filename)?;
        visualization::line_chart(&table, &req.x_column, &req.y_columns, req.options)
    })
    .await?;
    ok(chart)
}

pub async fn scatter_chart(
    State(state): State<AppState>,
    payload: Result<Json<ScatterChartRequest>, JsonRejection>,
) -> ApiResult<ChartSpec> {
    let req = body(payload)?;
    tracing::info!("Scatter chart request: {} x={} y={}", req.filename, req.x_column, req.y_column);

    let chart = blocking(move || {
        let table = state.store.load_table(&req.filename)?;
        visualization::scatter_chart(&table, &req.x_column, &req.y_column, req.options)
    })
    .await?;
    ok(chart)
}
