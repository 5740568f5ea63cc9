//! 规则生成端点

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::{GenerateRequest, GenerationRequest};
use crate::services::GenerationService;
use crate::state::AppState;

/// 标记结果来源（upstream / fallback）的响应头
pub const GENERATION_SOURCE_HEADER: &str = "x-generation-source";

/// 生成规则文件、项目结构和配置说明
async fn generate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(raw) = payload.map_err(|e| {
        warn!("Rejected generate request body: {}", e.body_text());
        AppError::BadRequest(format!("Invalid request body: {}", e.body_text()))
    })?;

    let request = GenerationRequest::try_from(raw)?;
    let generated = GenerationService::new(&state).generate(&request).await?;

    Ok((
        [(GENERATION_SOURCE_HEADER, generated.source.as_str())],
        Json(generated.result),
    )
        .into_response())
}

/// 创建生成路由
pub fn generate_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/generate", post(generate_handler))
}
