//! 配置与表单选项端点

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::OptionsResponse;
use crate::state::AppState;

/// 配置响应（隐藏 api_key 的实际值）
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    /// 是否已设置 API 密钥
    pub api_key_set: bool,
    /// API 基础 URL
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// 温度参数
    pub temperature: f64,
    /// 最大 token 数
    pub max_tokens: u32,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
}

impl From<&AppConfig> for ConfigResponse {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_key_set: config.api_key_set(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            request_timeout_secs: config.request_timeout_secs,
        }
    }
}

/// 获取当前配置
async fn get_config_handler(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse::from(state.config.as_ref()))
}

/// 获取表单可选项
async fn get_options_handler() -> Json<OptionsResponse> {
    Json(OptionsResponse::new())
}

/// 创建配置路由
pub fn config_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/config", get(get_config_handler))
        .route("/api/options", get(get_options_handler))
}
