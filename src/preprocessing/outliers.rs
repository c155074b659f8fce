//! Обнаружение и удаление выбросов

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::stats;
use crate::data::Table;
use crate::error::{DataError, Result};

pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;
const IQR_MULTIPLIER: f64 = 1.5;

/// Колонка -> позиции строк с выбросами
pub type OutlierMap = BTreeMap<String, BTreeSet<usize>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlierMethod {
    ZScore { threshold: f64 },
    Iqr,
}

impl OutlierMethod {
    pub fn zscore(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(DataError::invalid(format!(
                "threshold must be a positive number, got {threshold}"
            )));
        }
        Ok(OutlierMethod::ZScore { threshold })
    }

    /// Разбор по имени; порог используется только методом zscore
    pub fn from_name(name: &str, threshold: Option<f64>) -> Result<Self> {
        match name {
            "zscore" => Self::zscore(threshold.unwrap_or(DEFAULT_ZSCORE_THRESHOLD)),
            "iqr" => Ok(OutlierMethod::Iqr),
            other => Err(DataError::invalid(format!(
                "invalid outlier method '{other}', expected 'zscore' or 'iqr'"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutlierMethod::ZScore { .. } => "zscore",
            OutlierMethod::Iqr => "iqr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RemovalSummary {
    pub removed_rows: usize,
    pub removed_fraction: f64,
    pub remaining_rows: usize,
}

/// Поиск выбросов в числовых колонках. Текстовые колонки из выбора пропускаются.
pub fn detect_outliers(
    table: &Table,
    method: OutlierMethod,
    columns: Option<&[String]>,
) -> Result<OutlierMap> {
    let columns = table.resolve_numeric_columns(columns)?;
    let mut outliers = OutlierMap::new();

    for name in columns {
        let column = table.require_column(&name)?;
        let Some(values) = column.as_numeric() else {
            continue;
        };

        let present = stats::present(values);
        let is_outlier: Box<dyn Fn(f64) -> bool> = match method {
            OutlierMethod::ZScore { threshold } => {
                match (stats::mean(&present), stats::sample_std(&present)) {
                    (Some(mean), Some(std)) if std > 0.0 => {
                        tracing::debug!("Column '{}': mean={:.4}, std={:.4}", name, mean, std);
                        Box::new(move |x: f64| ((x - mean) / std).abs() > threshold)
                    }
                    _ => Box::new(|_: f64| false),
                }
            }
            OutlierMethod::Iqr => {
                match (stats::quantile(&present, 0.25), stats::quantile(&present, 0.75)) {
                    (Some(q1), Some(q3)) => {
                        let iqr = q3 - q1;
                        let lower = q1 - IQR_MULTIPLIER * iqr;
                        let upper = q3 + IQR_MULTIPLIER * iqr;
                        tracing::debug!("Column '{}': bounds [{:.4}, {:.4}]", name, lower, upper);
                        Box::new(move |x: f64| x < lower || x > upper)
                    }
                    _ => Box::new(|_: f64| false),
                }
            }
        };

        let rows = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|&x| is_outlier(x)).map(|_| i))
            .collect();
        outliers.insert(name, rows);
    }

    Ok(outliers)
}

/// Удаляет объединение всех отмеченных строк из копии таблицы
pub fn remove_outliers(table: &Table, outliers: &OutlierMap) -> Result<(Table, RemovalSummary)> {
    let rows: BTreeSet<usize> = outliers.values().flatten().copied().collect();

    if let Some(&row) = rows.iter().next_back().filter(|&&r| r >= table.n_rows()) {
        return Err(DataError::invalid(format!(
            "row index {row} out of range for table with {} rows",
            table.n_rows()
        )));
    }

    let cleaned = if rows.is_empty() {
        table.clone()
    } else {
        table.retain_rows(|i| !rows.contains(&i))
    };

    let removed_fraction = if table.n_rows() == 0 {
        0.0
    } else {
        rows.len() as f64 / table.n_rows() as f64
    };
    let summary = RemovalSummary {
        removed_rows: rows.len(),
        removed_fraction,
        remaining_rows: cleaned.n_rows(),
    };

    tracing::info!(
        "Removed {} rows ({:.1}%)",
        summary.removed_rows,
        summary.removed_fraction * 100.0
    );

    Ok((cleaned, summary))
}
