//! Плоское файловое хранилище загруженных таблиц

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{loader, Table};
use crate::error::{DataError, Result};

pub const ALLOWED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Каталог загрузок. Передается обработчикам явно через состояние приложения
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Создает каталог, если его нет
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        std::fs::create_dir_all(&store.root)?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_allowed(filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Проверка имени файла: без путей, без скрытых файлов, с разрешенным расширением
    pub fn sanitize(filename: &str) -> Result<String> {
        let name = filename.trim();
        if name.is_empty() {
            return Err(DataError::invalid("no selected file"));
        }
        if name.contains(['/', '\\']) || name.starts_with('.') || name.contains("..") {
            return Err(DataError::invalid(format!("invalid filename '{name}'")));
        }
        if !Self::is_allowed(name) {
            return Err(DataError::invalid(format!(
                "file type not allowed, expected one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }
        Ok(name.to_string())
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        Ok(self.root.join(Self::sanitize(filename)?))
    }

    pub fn save(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let name = Self::sanitize(filename)?;
        std::fs::write(self.root.join(&name), bytes)?;
        tracing::info!("Stored {} ({} bytes)", name, bytes.len());
        Ok(name)
    }

    /// Сохранение таблицы в CSV; имя обязано иметь расширение `.csv`
    pub fn save_table(&self, filename: &str, table: &Table) -> Result<String> {
        let name = Self::sanitize(filename)?;
        if loader::FileFormat::from_path(Path::new(&name))? != loader::FileFormat::Csv {
            return Err(DataError::invalid("cleaned tables can only be saved as .csv"));
        }
        loader::save_table(table, &self.root.join(&name))?;
        tracing::info!("Saved table {} ({} rows)", name, table.n_rows());
        Ok(name)
    }

    pub fn load_table(&self, filename: &str) -> Result<Table> {
        let path = self.path_for(filename)?;
        if !path.is_file() {
            return Err(DataError::NotFound(format!("file '{filename}' does not exist")));
        }
        loader::load_table(&path)
    }

    /// Все сохраненные файлы с разрешенными расширениями, по имени
    pub fn list(&self) -> Result<Vec<StoredFile>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !Self::is_allowed(&filename) {
                continue;
            }
            files.push(StoredFile {
                filename,
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }
}
