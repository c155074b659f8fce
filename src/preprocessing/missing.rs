//! Обработка пропущенных значений

use serde::{Deserialize, Serialize};

use super::stats;
use crate::data::{ColumnData, Table};
use crate::error::{DataError, Result};

/// Значение для стратегии `value`: число или строка
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

impl FillValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            FillValue::Number(v) => Some(*v),
            FillValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    fn as_text(&self) -> String {
        match self {
            FillValue::Number(v) => v.to_string(),
            FillValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MissingStrategy {
    Drop,
    Mean,
    Median,
    Mode,
    Value(FillValue),
}

impl MissingStrategy {
    pub const NAMES: [&'static str; 5] = ["drop", "mean", "median", "mode", "value"];

    /// Разбор стратегии по имени; `value` требует `fill_value`
    pub fn from_name(name: &str, fill_value: Option<FillValue>) -> Result<Self> {
        match name {
            "drop" => Ok(MissingStrategy::Drop),
            "mean" => Ok(MissingStrategy::Mean),
            "median" => Ok(MissingStrategy::Median),
            "mode" => Ok(MissingStrategy::Mode),
            "value" => fill_value.map(MissingStrategy::Value).ok_or_else(|| {
                DataError::invalid("fill_value must be provided when strategy is 'value'")
            }),
            other => Err(DataError::invalid(format!(
                "invalid strategy '{other}', expected one of: {}",
                Self::NAMES.join(", ")
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MissingStrategy::Drop => "drop",
            MissingStrategy::Mean => "mean",
            MissingStrategy::Median => "median",
            MissingStrategy::Mode => "mode",
            MissingStrategy::Value(_) => "value",
        }
    }
}

/// Заполнение или удаление пропусков в выбранных колонках (по умолчанию - во всех).
/// Возвращает новую таблицу, исходная не изменяется.
pub fn handle_missing_values(
    table: &Table,
    strategy: &MissingStrategy,
    columns: Option<&[String]>,
) -> Result<Table> {
    let columns = table.resolve_columns(columns)?;

    if matches!(strategy, MissingStrategy::Drop) {
        let selected: Vec<_> = columns
            .iter()
            .map(|name| table.require_column(name))
            .collect::<Result<_>>()?;
        let cleaned = table.retain_rows(|row| selected.iter().all(|c| !c.is_missing(row)));
        tracing::debug!(
            "Dropped {} rows with missing values",
            table.n_rows() - cleaned.n_rows()
        );
        return Ok(cleaned);
    }

    let mut cleaned = table.clone();
    for name in &columns {
        let column = table.require_column(name)?;
        if column.missing_count() == 0 {
            continue;
        }
        let filled = match column.data() {
            // Пустая колонка без значений принимает текстовое заполнение и становится текстовой
            ColumnData::Numeric(values) if column.missing_count() == values.len() => {
                match strategy {
                    MissingStrategy::Value(value) if value.as_number().is_none() => {
                        ColumnData::Text(vec![Some(value.as_text()); values.len()])
                    }
                    _ => ColumnData::Numeric(fill_numeric(name, values, strategy)?),
                }
            }
            ColumnData::Numeric(values) => ColumnData::Numeric(fill_numeric(name, values, strategy)?),
            ColumnData::Text(values) => ColumnData::Text(fill_text(name, values, strategy)?),
        };
        cleaned.set_column_data(name, filled)?;
    }

    Ok(cleaned)
}

fn fill_numeric(
    name: &str,
    values: &[Option<f64>],
    strategy: &MissingStrategy,
) -> Result<Vec<Option<f64>>> {
    let present = stats::present(values);
    let fill = match strategy {
        MissingStrategy::Mean => stats::mean(&present),
        MissingStrategy::Median => stats::median(&present),
        MissingStrategy::Mode => stats::numeric_mode(&present),
        MissingStrategy::Value(value) => Some(value.as_number().ok_or_else(|| {
            DataError::invalid(format!(
                "fill_value '{}' is not numeric but column '{name}' is",
                value.as_text()
            ))
        })?),
        MissingStrategy::Drop => return Ok(values.to_vec()),
    }
    .ok_or_else(|| undefined_statistic(name, strategy))?;

    tracing::debug!("Filling column '{}' with {} = {}", name, strategy.name(), fill);
    Ok(values.iter().map(|v| Some(v.unwrap_or(fill))).collect())
}

/// Для текстовых колонок mean/median не определены - используется мода
fn fill_text(
    name: &str,
    values: &[Option<String>],
    strategy: &MissingStrategy,
) -> Result<Vec<Option<String>>> {
    let fill = match strategy {
        MissingStrategy::Value(value) => value.as_text(),
        _ => stats::text_mode(values).ok_or_else(|| undefined_statistic(name, strategy))?,
    };

    Ok(values
        .iter()
        .map(|v| Some(v.clone().unwrap_or_else(|| fill.clone())))
        .collect())
}

fn undefined_statistic(name: &str, strategy: &MissingStrategy) -> DataError {
    DataError::Computation(format!(
        "cannot compute {} of column '{name}': all values are missing",
        strategy.name()
    ))
}
