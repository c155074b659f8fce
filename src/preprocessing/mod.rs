/// Модуль предобработки данных

pub mod missing;
pub mod normalization;
pub mod outliers;
pub mod stats;

pub use missing::{handle_missing_values, FillValue, MissingStrategy};
pub use normalization::{normalize_data, DataNormalizer, NormalizeMethod};
pub use outliers::{detect_outliers, remove_outliers, OutlierMap, OutlierMethod, RemovalSummary};
