use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use s3_file_manager::tree::DeleteReport;

use super::{CreateFolderReq, PathQuery};
use crate::api::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /folder - 创建目录
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFolderReq>,
) -> ApiResult<Value> {
    let prefix = state.tree.create_folder(&req.path).await?;
    Ok(Json(ApiResponse::success(json!({ "path": prefix }))))
}

/// DELETE /delete - 删除单个文件
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> ApiResult<()> {
    let path = query.path.ok_or_else(|| ApiError::bad_request("path is required"))?;
    state.tree.delete_object(&path).await?;
    Ok(Json(ApiResponse::message("File deleted successfully")))
}

/// DELETE /delete/folder - 递归删除目录
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> ApiResult<DeleteReport> {
    let path = query.path.ok_or_else(|| ApiError::bad_request("path is required"))?;
    let report = state.tree.delete_subtree(&path).await?;
    Ok(Json(ApiResponse::success(report)))
}
