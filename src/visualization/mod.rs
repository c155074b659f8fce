/// Подготовка данных для графиков

pub mod chart;

pub use chart::{line_chart, scatter_chart, ChartKind, ChartOptions, ChartSeries, ChartSpec};
