//! datalab - загрузка, очистка, визуализация и регрессионный анализ табличных данных

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod preprocessing;
pub mod storage;
pub mod types;
pub mod visualization;

pub use config::AppConfig;
pub use data::{Column, ColumnData, ColumnType, Table};
pub use error::{DataError, Result};
pub use models::{linear_regression, RegressionResult};
pub use preprocessing::{
    detect_outliers, handle_missing_values, normalize_data, remove_outliers, MissingStrategy,
    NormalizeMethod, OutlierMethod,
};
pub use storage::FileStore;
