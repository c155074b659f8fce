/// Табличные данные и их загрузка

pub mod loader;
pub mod table;

pub use loader::{load_table, read_csv, write_csv, FileFormat};
pub use table::{Column, ColumnData, ColumnType, Table};
