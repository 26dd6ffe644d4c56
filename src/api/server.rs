use axum::Json;
use serde_json::{json, Value};

/// GET /ping - 健康检查
pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}
