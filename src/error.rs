//! 统一错误处理模块
//!
//! 定义应用级错误类型，并实现 axum 的 IntoResponse trait 以便自动转换为 HTTP 响应。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm::LlmError;
use crate::utils::truncate_chars;

/// 缺少 API 密钥时返回给用户的提示
pub const CONFIGURATION_ERROR_MESSAGE: &str =
    "AI service is currently unavailable due to a configuration error. Please try again later.";

/// 未知错误时返回给用户的提示
pub const UNKNOWN_ERROR_MESSAGE: &str =
    "An unexpected error occurred during rule generation. Please try again.";

/// 错误详情最大长度
const MAX_DETAILS_LENGTH: usize = 500;

/// 应用错误枚举
#[derive(Error, Debug)]
pub enum AppError {
    /// 请求参数错误
    #[error("请求错误: {0}")]
    BadRequest(String),

    /// 配置相关错误（如未设置 API 密钥）
    #[error("配置错误: {0}")]
    Config(String),

    /// 上游服务返回非 2xx 状态
    #[error("上游错误 ({status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        details: String,
    },

    /// 无法连接上游服务
    #[error("网络错误: {0}")]
    Transport(String),

    /// 上游请求超时
    #[error("请求超时")]
    Timeout,

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl AppError {
    /// 根据上游状态码和响应体构建用户可读的错误
    pub fn upstream(status: u16, body: &str) -> Self {
        Self::Upstream {
            status,
            message: categorize_upstream_error(status, body),
            details: truncate_chars(body, MAX_DETAILS_LENGTH),
        }
    }
}

/// 将上游错误归类为用户可读的提示
pub fn categorize_upstream_error(status: u16, body: &str) -> String {
    let lowered = body.to_lowercase();
    if status == 401 {
        "Authentication with AI service failed. Please check API key.".to_string()
    } else if status == 429 {
        "AI service rate limit exceeded. Please try again in a few moments.".to_string()
    } else if status >= 500 {
        "AI service is temporarily unavailable. Please try again later.".to_string()
    } else if lowered.contains("quota") || lowered.contains("billing") {
        "AI service quota exceeded or billing issue. Please check your provider account.".to_string()
    } else {
        let reason = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown Error");
        format!("AI service request failed: {}.", reason)
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ApiError { status, message } => AppError::upstream(status, &message),
            LlmError::HttpError(e) => AppError::Transport(e.to_string()),
            LlmError::Timeout => AppError::Timeout,
            LlmError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    CONFIGURATION_ERROR_MESSAGE.to_string(),
                    None,
                )
            }
            AppError::Upstream {
                status,
                message,
                details,
            } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
                Some(details),
            ),
            AppError::Transport(msg) => {
                tracing::error!("Transport error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Could not reach AI service. Please check your connection and try again."
                        .to_string(),
                    None,
                )
            }
            AppError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "AI service did not respond in time. Please try again.".to_string(),
                None,
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    UNKNOWN_ERROR_MESSAGE.to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "success": false,
            "error": error_message
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}

/// 便捷类型别名
pub type AppResult<T> = Result<T, AppError>;
