pub mod files;
pub mod server;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use s3_file_manager::error::{FsError, StoreErrorKind};

use crate::state::AppState;

/// All HTTP routes / 路由表
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(server::ping))
        .route("/list", get(files::list_files))
        .route("/list/all", get(files::list_all_files))
        .route("/upload", post(files::upload_file))
        .route("/folder", post(files::create_folder))
        .route("/download", get(files::download_file))
        .route("/download/link", get(files::download_link))
        .route("/delete", delete(files::delete_file))
        .route("/delete/folder", delete(files::delete_folder))
        .layer(DefaultBodyLimit::disable()) // No size limit
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: 200,
            message: message.into(),
            data: None,
        }
    }
}

/// Error half of every handler result / 接口错误响应
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub data: Option<Value>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            data: None,
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// HTTP status for a core error / 错误到状态码的映射
pub fn status_of(err: &FsError) -> StatusCode {
    match err {
        FsError::Configuration(_) => StatusCode::BAD_REQUEST,
        FsError::Store(e) => match e.kind {
            StoreErrorKind::NotFound => StatusCode::NOT_FOUND,
            StoreErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            StoreErrorKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
        },
        FsError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        FsError::PartialFailure { .. } | FsError::DepthExceeded { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<FsError> for ApiError {
    fn from(err: FsError) -> Self {
        let status = status_of(&err);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        } else {
            tracing::warn!("Request rejected: {}", err);
        }

        let data = match &err {
            FsError::PartialFailure {
                prefix,
                failed_key,
                completed,
                ..
            } => Some(json!({
                "prefix": prefix,
                "failedKey": failed_key,
                "completed": completed,
            })),
            _ => None,
        };

        Self {
            status,
            message: err.to_string(),
            data,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse {
            code: self.status.as_u16() as i32,
            message: self.message,
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}
