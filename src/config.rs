//! Конфигурация сервера из переменных окружения

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{DataError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub preview_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
            preview_rows: 10,
        }
    }
}

impl AppConfig {
    /// Значения по умолчанию, переопределенные переменными `DATALAB_*`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("DATALAB_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("DATALAB_PORT") {
            config.port = parse_var("DATALAB_PORT", &port)?;
        }
        if let Some(dir) = lookup("DATALAB_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(mb) = lookup("DATALAB_MAX_UPLOAD_MB") {
            let mb: usize = parse_var("DATALAB_MAX_UPLOAD_MB", &mb)?;
            config.max_upload_bytes = mb * 1024 * 1024;
        }
        if let Some(rows) = lookup("DATALAB_PREVIEW_ROWS") {
            config.preview_rows = parse_var("DATALAB_PREVIEW_ROWS", &rows)?;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| DataError::invalid(format!("invalid listen address: {e}")))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DataError::invalid(format!("{key}={value:?}: {e}")))
}
