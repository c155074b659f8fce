//! Ошибки обработки данных

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    /// Неверное имя стратегии/метода, отсутствующий параметр, неизвестная колонка
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Статистика не определена (например, мода полностью пустой колонки)
    #[error("computation error: {0}")]
    Computation(String),

    /// Файл не удалось разобрать как таблицу
    #[error("failed to parse table: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DataError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn unknown_column(name: &str) -> Self {
        Self::InvalidArgument(format!("column '{name}' not found"))
    }

    /// Машиночитаемый вид ошибки для ответа API
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::Computation(_) => "computation_error",
            Self::Parse(_) => "parse_error",
            Self::Io(_) => "io_error",
        }
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => Self::Io(io),
                other => Self::Parse(format!("{other:?}")),
            }
        } else {
            Self::Parse(err.to_string())
        }
    }
}

impl From<calamine::Error> for DataError {
    fn from(err: calamine::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(DataError::invalid("x").kind(), "invalid_argument");
        assert_eq!(DataError::NotFound("a.csv".into()).kind(), "not_found");
        assert_eq!(DataError::Computation("mode".into()).kind(), "computation_error");
    }

    #[test]
    fn test_unknown_column_message() {
        let err = DataError::unknown_column("price");
        assert!(matches!(err, DataError::InvalidArgument(_)));
        assert!(err.to_string().contains("'price'"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DataError = io_err.into();
        assert_eq!(err.kind(), "io_error");
    }
}
