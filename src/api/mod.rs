//! HTTP API поверх библиотеки обработки данных

pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::DataError;
use crate::storage::FileStore;
use crate::types::{ErrorBody, ErrorResponse};

/// Неизменяемое состояние, общее для всех обработчиков
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FileStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: FileStore, config: AppConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/upload", post(handlers::upload))
        .route("/api/files", get(handlers::list_files))
        .route("/api/preview/:filename", get(handlers::preview))
        .route("/api/clean/missing", post(handlers::clean_missing))
        .route("/api/clean/outliers/detect", post(handlers::detect_outliers))
        .route("/api/clean/outliers/remove", post(handlers::remove_outliers))
        .route("/api/clean/normalize", post(handlers::normalize))
        .route("/api/analysis/regression", post(handlers::fit_regression))
        .route("/api/visualize/line", post(handlers::line_chart))
        .route("/api/visualize/scatter", post(handlers::scatter_chart))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Ошибка обработчика; превращается в структурированный JSON-ответ
#[derive(Debug)]
pub struct ApiError(pub DataError);

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            DataError::InvalidArgument(_) | DataError::Parse(_) => StatusCode::BAD_REQUEST,
            DataError::NotFound(_) => StatusCode::NOT_FOUND,
            DataError::Computation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DataError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::warn!("Request rejected: {}", self.0);
        }

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: status.as_u16(),
                kind: self.0.kind().to_string(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
