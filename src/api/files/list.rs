use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use tokio_util::sync::CancellationToken;

use s3_file_manager::error::FsError;
use s3_file_manager::models::AggregateResult;
use s3_file_manager::query::{apply_filters, sort_entries, FilterParams, SortSpec};
use s3_file_manager::tree::DelimiterMode;

use super::{ListAllQuery, ListQuery};
use crate::api::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Continuation token header / 分页令牌请求头
const NEXT_TOKEN_HEADER: &str = "x-next";

/// GET /list - 列出目录的一页
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<AggregateResult> {
    let path = query.path.unwrap_or_default();
    let token = headers
        .get(NEXT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or(query.next_page_token);
    let page_size = query.page_size.unwrap_or(state.config.listing.page_size);
    let mode = if query.flat.unwrap_or(false) {
        DelimiterMode::Flat
    } else {
        DelimiterMode::Shallow
    };

    let mut result = state
        .tree
        .list_page_mode(
            &path,
            token.as_deref(),
            page_size,
            query.is_folder.unwrap_or(false),
            mode,
        )
        .await?;

    if query.with_links.unwrap_or(false) {
        state
            .tree
            .attach_links(&state.links, &mut result.entries, state.link_ttl())
            .await?;
    }

    Ok(Json(ApiResponse::success(result)))
}

/// GET /list/all - 递归列出整个子树，然后过滤排序
pub async fn list_all_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAllQuery>,
    Query(filters): Query<FilterParams>,
) -> ApiResult<AggregateResult> {
    // Reject bad names before touching the store / 先校验参数
    let filter = filters.parse()?;
    let sort = SortSpec::parse(query.sort_by.as_deref(), query.order.as_deref())?;
    let path = query.path.unwrap_or_default();

    let cancel = CancellationToken::new();
    let timer = {
        let cancel = cancel.clone();
        let timeout = state.request_timeout();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            cancel.cancel();
        })
    };
    let walked = state.tree.list_recursive_until(&path, &cancel).await;
    timer.abort();

    let snapshot = match walked {
        Ok(snapshot) => snapshot,
        Err(FsError::Cancelled) => {
            tracing::warn!("list_all timed out after {:?}: path={}", state.request_timeout(), path);
            return Err(FsError::Cancelled.into());
        }
        Err(e) => return Err(e.into()),
    };

    let entries = if filter.is_empty() {
        snapshot.entries
    } else {
        apply_filters(&snapshot.entries, &filter)
    };
    let entries = sort_entries(entries, sort);
    let mut result = AggregateResult::new(entries, None);

    if query.with_links.unwrap_or(false) {
        state
            .tree
            .attach_links(&state.links, &mut result.entries, state.link_ttl())
            .await?;
    }

    tracing::debug!(
        "list_all: path={}, returned={}, files={}, folders={}",
        path,
        result.records_returned(),
        result.file_count,
        result.folder_count
    );
    Ok(Json(ApiResponse::success(result)))
}
