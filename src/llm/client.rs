//! 统一 LLM 客户端

use reqwest::Client;
use std::time::Duration;
use tracing::info;

use super::format::build_chat_endpoint;
use super::openai::complete_openai;
use super::types::{ChatMessage, ChatOptions, Completion, LlmError};

/// LLM 客户端
///
/// 面向 OpenAI 兼容的 Chat Completions 接口，每次调用只发送一次请求，不重试。
/// 调用方 future 被丢弃（例如客户端断开连接）时，进行中的请求随之中止。
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::ConfigError("API Key is required".to_string()));
        }

        // 构建 HTTP 客户端
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            api_key,
            endpoint: build_chat_endpoint(base_url),
        })
    }

    /// 请求端点
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// API 密钥（仅用于脱敏日志）
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// 发送一次补全请求并返回完整回复
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &ChatOptions,
    ) -> Result<Completion, LlmError> {
        info!(
            "LLM request: model={}, messages={}",
            model,
            messages.len()
        );
        complete_openai(
            &self.client,
            &self.api_key,
            &self.endpoint,
            messages,
            model,
            options,
        )
        .await
    }
}
