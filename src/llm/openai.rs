//! OpenAI Chat Completions API 实现（非流式，JSON 模式）

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::types::{ChatMessage, ChatOptions, Completion, LlmError};
use crate::utils::truncate_chars;

/// OpenAI 请求载荷
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// OpenAI 响应
#[derive(Deserialize, Debug)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize, Debug)]
struct OpenAiChoice {
    #[serde(default)]
    message: Option<OpenAiMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

/// 将 reqwest 错误区分为超时与其他网络错误
fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::HttpError(e)
    }
}

/// 调用 OpenAI 兼容接口并返回完整回复
pub async fn complete_openai(
    client: &Client,
    api_key: &str,
    endpoint: &str,
    messages: &[ChatMessage],
    model: &str,
    options: &ChatOptions,
) -> Result<Completion, LlmError> {
    let payload = OpenAiRequest {
        model,
        messages,
        stream: false,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        response_format: options.response_format.as_ref().map(|t| ResponseFormat {
            format_type: t.clone(),
        }),
    };

    debug!("OpenAI API request: endpoint={}, model={}", endpoint, model);

    let response = client
        .post(endpoint)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await
        .map_err(map_transport_error)?;

    let status = response.status();
    let body = response.text().await.map_err(map_transport_error)?;

    if !status.is_success() {
        let status_code = status.as_u16();
        error!(
            "OpenAI API error: status={}, body={}",
            status_code,
            truncate_chars(&body, 500)
        );
        return Err(LlmError::ApiError {
            status: status_code,
            message: body,
        });
    }

    if body.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let parsed: OpenAiResponse = serde_json::from_str(&body)?;
    let choice = parsed.choices.into_iter().next();
    let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
    let content = choice
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)?;

    debug!(
        "OpenAI API response: length={}, finish_reason={:?}",
        content.len(),
        finish_reason
    );

    Ok(Completion {
        content,
        finish_reason,
    })
}
