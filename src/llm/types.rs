//! LLM 类型定义

use serde::{Deserialize, Serialize};

/// 聊天消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 角色：system, user, assistant
    pub role: String,
    /// 消息内容
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// 聊天选项
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// 温度参数
    pub temperature: Option<f64>,
    /// 最大 token 数
    pub max_tokens: Option<u32>,
    /// 响应格式（如 "json_object"）
    pub response_format: Option<String>,
}

/// 完整（非流式）响应
#[derive(Debug, Clone, Default)]
pub struct Completion {
    /// 模型回复内容
    pub content: String,
    /// 完成原因
    pub finish_reason: Option<String>,
}

/// LLM 错误类型
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP 请求错误（网络层）
    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API 返回错误
    #[error("API 错误 ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 超时错误
    #[error("请求超时")]
    Timeout,

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 响应体不是预期的 JSON 结构
    #[error("JSON 解析失败: {0}")]
    JsonError(#[from] serde_json::Error),

    /// 模型返回空内容
    #[error("模型返回空响应")]
    EmptyResponse,
}

impl LlmError {
    /// 错误类别名称，用于请求日志
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::HttpError(_) => "transport",
            LlmError::ApiError { .. } => "upstream",
            LlmError::Timeout => "timeout",
            LlmError::ConfigError(_) => "configuration",
            LlmError::JsonError(_) => "malformed_response",
            LlmError::EmptyResponse => "empty_response",
        }
    }

    /// 上游 HTTP 状态码（如有）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
