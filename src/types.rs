/// Типы запросов и ответов API

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::data::{ColumnType, Table};
use crate::models::regression::{DEFAULT_SEED, DEFAULT_TEST_SIZE};
use crate::preprocessing::{FillValue, OutlierMap, RemovalSummary};
use crate::visualization::ChartOptions;

/// Обертка успешного ответа: `{"success": true, "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutput {
    pub filename: String,
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Структура таблицы и первые строки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePreview {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub dtypes: HashMap<String, ColumnType>,
    pub missing_values: HashMap<String, usize>,
    pub preview: Vec<Map<String, JsonValue>>,
}

impl TablePreview {
    pub fn from_table(table: &Table, preview_rows: usize) -> Self {
        Self {
            rows: table.n_rows(),
            columns: table.n_cols(),
            column_names: table.column_names(),
            dtypes: table
                .columns()
                .iter()
                .map(|c| (c.name().to_string(), c.column_type()))
                .collect(),
            missing_values: table
                .columns()
                .iter()
                .map(|c| (c.name().to_string(), c.missing_count()))
                .collect(),
            preview: table.records(preview_rows),
        }
    }
}

fn default_outlier_method() -> String {
    "zscore".to_string()
}

fn default_normalize_method() -> String {
    "minmax".to_string()
}

fn default_test_size() -> f64 {
    DEFAULT_TEST_SIZE
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingValuesRequest {
    pub filename: String,
    pub strategy: String,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub fill_value: Option<FillValue>,
    #[serde(default)]
    pub save_as: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierRequest {
    pub filename: String,
    #[serde(default = "default_outlier_method")]
    pub method: String,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub save_as: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeRequest {
    pub filename: String,
    #[serde(default = "default_normalize_method")]
    pub method: String,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub save_as: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionRequest {
    pub filename: String,
    pub features: Vec<String>,
    pub target: String,
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_seed")]
    pub random_state: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineChartRequest {
    pub filename: String,
    pub x_column: String,
    pub y_columns: Vec<String>,
    #[serde(flatten)]
    pub options: ChartOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScatterChartRequest {
    pub filename: String,
    pub x_column: String,
    pub y_column: String,
    #[serde(flatten)]
    pub options: ChartOptions,
}

/// Результат очистки: структура новой таблицы и имя сохраненного файла, если был `save_as`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanOutput {
    pub saved_as: Option<String>,
    pub table: TablePreview,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierDetectOutput {
    pub method: String,
    pub outliers: OutlierMap,
    pub total_outlier_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierRemoveOutput {
    pub method: String,
    pub outliers: OutlierMap,
    pub summary: RemovalSummary,
    pub saved_as: Option<String>,
    pub table: TablePreview,
}
