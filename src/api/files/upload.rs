use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::api::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /upload - 上传文件（multipart: path, file）
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Value> {
    let mut folder = String::new();
    let mut filename = String::new();
    let mut file_data: Option<Bytes> = None;

    // 解析multipart数据
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "path" => {
                folder = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read path: {}", e)))?;
            }
            "file" => {
                if filename.is_empty() {
                    filename = field.file_name().unwrap_or("").to_string();
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
                file_data = Some(data);
            }
            "filename" => {
                filename = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read filename: {}", e)))?;
            }
            _ => {}
        }
    }

    let data = file_data.ok_or_else(|| ApiError::bad_request("Failed to retrieve uploaded file"))?;
    let key = state.tree.upload_object(&folder, &filename, data).await?;

    Ok(Json(ApiResponse::success(json!({
        "message": format!("File uploaded successfully with object key: {}", key),
        "key": key,
    }))))
}
