//! Нормализация данных

use serde::Serialize;

use super::stats;
use crate::data::{ColumnData, Table};
use crate::error::{DataError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMethod {
    /// (x - min) / (max - min), значения в [0, 1]
    MinMax,
    /// (x - mean) / std
    ZScore,
}

impl std::str::FromStr for NormalizeMethod {
    type Err = DataError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "minmax" => Ok(NormalizeMethod::MinMax),
            "zscore" => Ok(NormalizeMethod::ZScore),
            other => Err(DataError::invalid(format!(
                "invalid normalization method '{other}', expected 'minmax' or 'zscore'"
            ))),
        }
    }
}

/// Параметры преобразования одной колонки: x' = (x - offset) / scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataNormalizer {
    offset: f64,
    scale: f64,
}

impl DataNormalizer {
    /// Оценка параметров по непропущенным значениям.
    /// `None`, если колонка постоянная (деление на ноль) или значений слишком мало.
    pub fn fit(method: NormalizeMethod, values: &[Option<f64>]) -> Option<Self> {
        let present = stats::present(values);
        let (offset, scale) = match method {
            NormalizeMethod::MinMax => {
                let (min, max) = stats::min_max(&present)?;
                (min, max - min)
            }
            NormalizeMethod::ZScore => (stats::mean(&present)?, stats::sample_std(&present)?),
        };

        if scale > 0.0 && scale.is_finite() {
            Some(Self { offset, scale })
        } else {
            None
        }
    }

    pub fn transform(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        values
            .iter()
            .map(|v| v.map(|x| (x - self.offset) / self.scale))
            .collect()
    }
}

/// Масштабирование числовых колонок (по умолчанию - всех). Текстовые пропускаются,
/// постоянные колонки остаются без изменений.
pub fn normalize_data(
    table: &Table,
    method: NormalizeMethod,
    columns: Option<&[String]>,
) -> Result<Table> {
    let columns = table.resolve_numeric_columns(columns)?;
    let mut normalized = table.clone();

    for name in &columns {
        let column = table.require_column(name)?;
        let Some(values) = column.as_numeric() else {
            continue;
        };

        match DataNormalizer::fit(method, values) {
            Some(normalizer) => {
                normalized.set_column_data(name, ColumnData::Numeric(normalizer.transform(values)))?;
            }
            None => tracing::debug!("Column '{}' has zero spread, left unchanged", name),
        }
    }

    Ok(normalized)
}
