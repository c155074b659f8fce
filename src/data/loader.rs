//! Чтение таблиц из CSV/Excel и запись обратно в CSV

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::table::{Column, ColumnData, Table};
use crate::error::{DataError, Result};

/// Значения, которые считаются пропуском при чтении
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

/// Формат файла определяется по расширению
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Excel),
            other => Err(DataError::invalid(format!("unsupported file extension: .{other}"))),
        }
    }
}

pub fn load_table(path: &Path) -> Result<Table> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => {
            let file = std::fs::File::open(path)?;
            read_csv(file)
        }
        FileFormat::Excel => read_excel(path),
    }
}

pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(false).from_reader(reader);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (col, value) in record.iter().enumerate() {
            raw[col].push(value.to_string());
        }
    }

    build_table(headers, raw)
}

/// Первый лист книги; первая строка - заголовки
fn read_excel(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DataError::Parse("workbook has no sheets".to_string()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => return Table::new(Vec::new()),
    };

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col, values) in raw.iter_mut().enumerate() {
            let cell = row.get(col).map(excel_cell_text).unwrap_or_default();
            values.push(cell);
        }
    }

    build_table(headers, raw)
}

fn excel_cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

/// Вывод типа колонки: числовая, если каждое непустое значение - конечное число
fn build_table(headers: Vec<String>, raw: Vec<Vec<String>>) -> Result<Table> {
    let columns = unique_headers(headers)
        .into_iter()
        .zip(raw)
        .map(|(name, values)| Column::new(name, infer_column(values)))
        .collect();

    Table::new(columns)
}

/// Пустые заголовки -> `Unnamed: {idx}`, повторы -> `a`, `a.1`, `a.2`, ...
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();

    headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let base = if name.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name
            };

            let mut candidate = base.clone();
            while used.contains(&candidate) {
                let counter = counters.entry(base.clone()).or_insert(0);
                *counter += 1;
                candidate = format!("{base}.{counter}");
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

fn infer_column(values: Vec<String>) -> ColumnData {
    let cells: Vec<Option<String>> = values
        .into_iter()
        .map(|v| {
            let trimmed = v.trim();
            if MISSING_TOKENS.contains(&trimmed) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect();

    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(s) => s.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some),
        })
        .collect();

    match parsed {
        Some(numbers) if numbers.iter().any(Option::is_some) => ColumnData::Numeric(numbers),
        // Полностью пустая колонка считается числовой, как в pandas
        Some(numbers) if !numbers.is_empty() => ColumnData::Numeric(numbers),
        _ => ColumnData::Text(cells),
    }
}

pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.column_names())?;
    for row in 0..table.n_rows() {
        writer.write_record(table.columns().iter().map(|c| c.display_value(row)))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_table(table: &Table, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(table, file)
}
