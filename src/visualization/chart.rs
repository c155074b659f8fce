//! Описание графиков для фронтенда

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::Table;
use crate::error::{DataError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Scatter,
}

impl ChartKind {
    fn trace_mode(self) -> &'static str {
        match self {
            ChartKind::Line => "lines+markers",
            ChartKind::Scatter => "markers",
        }
    }

    fn default_title(self) -> &'static str {
        match self {
            ChartKind::Line => "Line Chart",
            ChartKind::Scatter => "Scatter Plot",
        }
    }
}

/// Подписи графика; незаданные берутся по умолчанию
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartOptions {
    pub title: Option<String>,
    pub xaxis_title: Option<String>,
    pub yaxis_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub mode: &'static str,
    pub x: Vec<JsonValue>,
    pub y: Vec<JsonValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub xaxis_title: String,
    pub yaxis_title: String,
    pub legend_title: String,
    pub series: Vec<ChartSeries>,
}

/// Линейный график: по одной линии на каждую колонку из `y_columns`
pub fn line_chart(
    table: &Table,
    x_column: &str,
    y_columns: &[String],
    options: ChartOptions,
) -> Result<ChartSpec> {
    build_chart(ChartKind::Line, table, x_column, y_columns, options)
}

pub fn scatter_chart(
    table: &Table,
    x_column: &str,
    y_column: &str,
    options: ChartOptions,
) -> Result<ChartSpec> {
    build_chart(ChartKind::Scatter, table, x_column, &[y_column.to_string()], options)
}

fn build_chart(
    kind: ChartKind,
    table: &Table,
    x_column: &str,
    y_columns: &[String],
    options: ChartOptions,
) -> Result<ChartSpec> {
    if y_columns.is_empty() {
        return Err(DataError::invalid("at least one y column is required"));
    }

    let x = table.require_column(x_column)?;
    let x_values: Vec<JsonValue> = (0..table.n_rows()).map(|i| x.json_value(i)).collect();

    let series = y_columns
        .iter()
        .map(|name| {
            let y = table.require_column(name)?;
            Ok(ChartSeries {
                name: name.clone(),
                mode: kind.trace_mode(),
                x: x_values.clone(),
                y: (0..table.n_rows()).map(|i| y.json_value(i)).collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChartSpec {
        kind,
        title: options.title.unwrap_or_else(|| kind.default_title().to_string()),
        xaxis_title: options.xaxis_title.unwrap_or_else(|| "X Axis".to_string()),
        yaxis_title: options.yaxis_title.unwrap_or_else(|| "Y Axis".to_string()),
        legend_title: "Series".to_string(),
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use serde_json::json;

    fn table() -> Table {
        Table::new(vec![
            Column::text("month", vec![Some("jan".into()), Some("feb".into()), Some("mar".into())]),
            Column::numeric("sales", vec![Some(10.0), None, Some(12.5)]),
            Column::numeric("costs", vec![Some(4.0), Some(5.0), Some(6.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_line_chart_one_series_per_column() {
        let ys = vec!["sales".to_string(), "costs".to_string()];
        let chart = line_chart(&table(), "month", &ys, ChartOptions::default()).unwrap();

        assert_eq!(chart.title, "Line Chart");
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].mode, "lines+markers");
        assert_eq!(chart.series[0].x, vec![json!("jan"), json!("feb"), json!("mar")]);
        assert_eq!(chart.series[0].y, vec![json!(10.0), JsonValue::Null, json!(12.5)]);
    }

    #[test]
    fn test_custom_titles() {
        let options = ChartOptions {
            title: Some("Revenue".into()),
            xaxis_title: None,
            yaxis_title: Some("EUR".into()),
        };
        let chart = scatter_chart(&table(), "costs", "sales", options).unwrap();
        assert_eq!(chart.kind, ChartKind::Scatter);
        assert_eq!(chart.title, "Revenue");
        assert_eq!(chart.xaxis_title, "X Axis");
        assert_eq!(chart.yaxis_title, "EUR");
        assert_eq!(chart.series[0].mode, "markers");
    }

    #[test]
    fn test_unknown_column_fails() {
        let ys = vec!["profit".to_string()];
        assert!(matches!(
            line_chart(&table(), "month", &ys, ChartOptions::default()),
            Err(DataError::InvalidArgument(_))
        ));
        let ys = vec!["sales".to_string()];
        assert!(line_chart(&table(), "day", &ys, ChartOptions::default()).is_err());
        assert!(line_chart(&table(), "month", &[], ChartOptions::default()).is_err());
    }
}
