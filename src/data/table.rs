//! Табличная модель: именованные колонки с явным типом

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{DataError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Text,
}

/// Данные колонки. `None` - пропущенное значение
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_rows(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(values) => {
                ColumnData::Numeric(rows.iter().map(|&i| values[i]).collect())
            }
            ColumnData::Text(values) => {
                ColumnData::Text(rows.iter().map(|&i| values[i].clone()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn column_type(&self) -> ColumnType {
        match self.data {
            ColumnData::Numeric(_) => ColumnType::Numeric,
            ColumnData::Text(_) => ColumnType::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.column_type() == ColumnType::Numeric
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Text(_) => None,
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match &self.data {
            ColumnData::Numeric(values) => values[row].is_none(),
            ColumnData::Text(values) => values[row].is_none(),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }

    /// Значение ячейки в JSON; пропуск сериализуется как `null`
    pub fn json_value(&self, row: usize) -> JsonValue {
        match &self.data {
            ColumnData::Numeric(values) => values[row]
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ColumnData::Text(values) => values[row]
                .as_ref()
                .map(|s| JsonValue::String(s.clone()))
                .unwrap_or(JsonValue::Null),
        }
    }

    /// Текстовое представление ячейки (пустая строка для пропуска)
    pub fn display_value(&self, row: usize) -> String {
        match &self.data {
            ColumnData::Numeric(values) => values[row].map(|v| v.to_string()).unwrap_or_default(),
            ColumnData::Text(values) => values[row].clone().unwrap_or_default(),
        }
    }
}

/// Таблица: упорядоченный набор колонок одинаковой длины с уникальными именами
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(DataError::invalid(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
            if column.len() != n_rows {
                return Err(DataError::invalid(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name(),
                    column.len(),
                    n_rows
                )));
            }
        }

        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| DataError::unknown_column(name))
    }

    /// Разрешение выбора колонок: `None` - все колонки, иначе каждая должна существовать
    pub fn resolve_columns(&self, selection: Option<&[String]>) -> Result<Vec<String>> {
        self.resolve_or(selection, Self::column_names)
    }

    /// То же, но по умолчанию берутся только числовые колонки
    pub fn resolve_numeric_columns(&self, selection: Option<&[String]>) -> Result<Vec<String>> {
        self.resolve_or(selection, Self::numeric_column_names)
    }

    fn resolve_or(
        &self,
        selection: Option<&[String]>,
        default: fn(&Self) -> Vec<String>,
    ) -> Result<Vec<String>> {
        match selection {
            None => Ok(default(self)),
            Some(names) => {
                for name in names {
                    self.require_column(name)?;
                }
                Ok(names.to_vec())
            }
        }
    }

    /// Новая таблица только со строками, для которых `keep` вернул true
    pub fn retain_rows(&self, keep: impl Fn(usize) -> bool) -> Table {
        let rows: Vec<usize> = (0..self.n_rows).filter(|&i| keep(i)).collect();
        self.take_rows(&rows)
    }

    pub fn take_rows(&self, rows: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.take_rows(rows)))
            .collect();
        Table {
            columns,
            n_rows: rows.len(),
        }
    }

    /// Замена данных колонки; длина и имя сохраняются
    pub(crate) fn set_column_data(&mut self, name: &str, data: ColumnData) -> Result<()> {
        if data.len() != self.n_rows {
            return Err(DataError::invalid(format!(
                "replacement for column '{name}' has {} rows, expected {}",
                data.len(),
                self.n_rows
            )));
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| DataError::unknown_column(name))?;
        column.data = data;
        Ok(())
    }

    /// Первые `limit` строк в виде записей `{колонка: значение}`
    pub fn records(&self, limit: usize) -> Vec<Map<String, JsonValue>> {
        (0..self.n_rows.min(limit))
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| (c.name().to_string(), c.json_value(row)))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::numeric("a", vec![Some(1.0), None, Some(3.0)]),
            Column::text("b", vec![Some("x".into()), Some("y".into()), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("b", vec![Some(1.0), Some(2.0)]),
        ]);
        assert!(matches!(result, Err(DataError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = Table::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::text("a", vec![None]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_and_missing_counts() {
        let table = sample();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.numeric_column_names(), vec!["a".to_string()]);
        assert_eq!(table.column("a").unwrap().missing_count(), 1);
        assert_eq!(table.column("b").unwrap().column_type(), ColumnType::Text);
    }

    #[test]
    fn test_resolve_unknown_column() {
        let table = sample();
        let selection = vec!["zzz".to_string()];
        assert!(table.resolve_columns(Some(&selection)).is_err());
        assert_eq!(table.resolve_numeric_columns(None).unwrap(), vec!["a"]);
    }

    #[test]
    fn test_retain_rows_keeps_original() {
        let table = sample();
        let filtered = table.retain_rows(|i| i != 1);
        assert_eq!(filtered.n_rows(), 2);
        assert_eq!(table.n_rows(), 3);
        assert_eq!(filtered.column("a").unwrap().as_numeric().unwrap(), &[Some(1.0), Some(3.0)]);
    }

    #[test]
    fn test_records_use_null_for_missing() {
        let records = sample().records(10);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1]["a"], JsonValue::Null);
        assert_eq!(records[0]["b"], JsonValue::String("x".into()));
    }
}
