use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;

use s3_file_manager::utils::{base_name, object_key};

use super::ObjectQuery;
use crate::api::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /download - 流式下载文件
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ObjectQuery>,
) -> Result<Response, ApiError> {
    let key = object_key(query.key());
    let reader = state.tree.get_object(&key).await?;

    let filename = match base_name(&key) {
        "" => "download",
        name => name,
    };
    let filename_encoded = urlencoding::encode(filename);
    let content_type = mime_guess::from_path(&key).first_or_octet_stream().to_string();

    tracing::debug!("download: key={}, content_type={}", key, content_type);

    let body = Body::from_stream(ReaderStream::new(reader));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", filename_encoded, filename_encoded),
        )
        .body(body)
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("failed to build response: {}", e),
            data: None,
        })
}

/// GET /download/link - 获取缓存的预签名下载链接
pub async fn download_link(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ObjectQuery>,
) -> ApiResult<Value> {
    let key = object_key(query.key());
    let ttl = state.link_ttl();
    let url = state.tree.download_link(&state.links, &key, ttl).await?;

    Ok(Json(ApiResponse::success(json!({
        "key": key,
        "url": url,
        "expiresIn": ttl.as_secs(),
    }))))
}
