//! 生成服务
//!
//! 串联 Prompt 构建、上游调用、回复校验和本地模板生成：
//!
//! - 未配置 API 密钥、网络错误、超时、上游非 2xx：返回错误响应
//! - 上游回复为空或无法解析、或所有字段都不可用：使用本地模板生成
//! - 部分字段不可用：替换为占位内容后返回

use std::time::Instant;
use tracing::{info, warn};

use super::fallback::synthesize;
use super::normalizer::{validate_reply, Validation};
use crate::config::API_KEY_ENV;
use crate::error::{AppError, AppResult};
use crate::llm::{ChatOptions, LlmError};
use crate::models::{GenerationRequest, GenerationResult};
use crate::state::AppState;
use crate::utils::{GenerationOutcome, RequestLogger};

/// 结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    /// 来自上游模型（可能含占位内容）
    Upstream,
    /// 来自本地模板
    Fallback,
}

impl GenerationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationSource::Upstream => "upstream",
            GenerationSource::Fallback => "fallback",
        }
    }
}

/// 生成结果及其来源
#[derive(Debug, Clone)]
pub struct Generated {
    pub result: GenerationResult,
    pub source: GenerationSource,
}

impl Generated {
    fn fallback(request: &GenerationRequest) -> Self {
        Self {
            result: synthesize(request),
            source: GenerationSource::Fallback,
        }
    }
}

/// 根据模型回复文本得出最终结果
pub fn resolve_reply(raw: &str, request: &GenerationRequest) -> (Generated, GenerationOutcome) {
    match validate_reply(raw, request.editor) {
        Validation::Valid(result) => (
            Generated {
                result,
                source: GenerationSource::Upstream,
            },
            GenerationOutcome::Upstream,
        ),
        Validation::Invalid {
            reason,
            partial: Some(normalized),
        } if !normalized.is_unusable() => {
            warn!("AI reply repaired: {}", reason);
            (
                Generated {
                    result: normalized.result,
                    source: GenerationSource::Upstream,
                },
                GenerationOutcome::Repaired,
            )
        }
        Validation::Invalid { reason, .. } => {
            warn!("AI reply unusable, using template fallback: {}", reason);
            (Generated::fallback(request), GenerationOutcome::Fallback)
        }
    }
}

/// 生成服务
pub struct GenerationService<'a> {
    state: &'a AppState,
}

impl<'a> GenerationService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// 处理一次生成请求
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<Generated> {
        let client = self.state.llm.as_ref().ok_or_else(|| {
            AppError::Config(format!("{} is not set; AI generation is disabled", API_KEY_ENV))
        })?;

        let config = &self.state.config;
        let messages = self.state.prompts.build_chat_messages(request);
        let options = ChatOptions {
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            response_format: Some("json_object".to_string()),
        };

        let request_id = RequestLogger::generate_request_id();
        let logger = self.state.request_logger.as_deref();
        let log_entry = logger.map(|l| {
            l.log_request(
                &request_id,
                client.endpoint(),
                client.api_key(),
                &config.model,
                request,
                &options,
                config.request_timeout_secs,
            )
        });

        info!(
            "Generating rules: request_id={}, editor={}, framework={}, backend={}, database={}",
            request_id, request.editor, request.framework, request.backend, request.database
        );

        let start = Instant::now();
        let outcome = client.complete(&messages, &config.model, &options).await;

        match outcome {
            Ok(completion) => {
                if completion.finish_reason.as_deref() == Some("length") {
                    warn!(
                        "AI reply hit max_tokens and may be truncated: request_id={}, max_tokens={}",
                        request_id, config.max_tokens
                    );
                }
                let (generated, outcome) = resolve_reply(&completion.content, request);
                if let (Some(logger), Some(entry)) = (logger, log_entry) {
                    logger.log_success(entry, start, &completion.content, outcome);
                }
                info!(
                    "Generation finished: request_id={}, outcome={:?}, rules={}, elapsed_ms={}",
                    request_id,
                    outcome,
                    generated.result.generated_rules.len(),
                    start.elapsed().as_millis()
                );
                Ok(generated)
            }
            Err(err @ (LlmError::EmptyResponse | LlmError::JsonError(_))) => {
                warn!(
                    "AI service returned no usable reply, using template fallback: request_id={}, error={}",
                    request_id, err
                );
                if let (Some(logger), Some(entry)) = (logger, log_entry) {
                    logger.log_error(entry, start, &err, GenerationOutcome::Fallback);
                }
                Ok(Generated::fallback(request))
            }
            Err(err) => {
                warn!("Generation failed: request_id={}, error={}", request_id, err);
                if let (Some(logger), Some(entry)) = (logger, log_entry) {
                    logger.log_error(entry, start, &err, GenerationOutcome::Failed);
                }
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{BackendPlatform, Database, FrontendFramework, TargetEditor};
    use crate::services::PromptService;
    use crate::testing::{spawn_upstream, UpstreamReply};
    use serde_json::json;

    fn request() -> GenerationRequest {
        GenerationRequest {
            description: "A budgeting app".to_string(),
            framework: FrontendFramework::Svelte,
            backend: BackendPlatform::NodeJs,
            database: Database::MySql,
            editor: TargetEditor::Cursor,
        }
    }

    fn state_for(base_url: &str, log_dir: Option<&std::path::Path>) -> AppState {
        let config = AppConfig {
            api_key: "sk-test-key-123456".to_string(),
            base_url: base_url.to_string(),
            request_log_dir: log_dir.map(|p| p.to_path_buf()),
            ..AppConfig::default()
        };
        AppState::new(config, PromptService::default()).unwrap()
    }

    fn well_formed_reply() -> String {
        json!({
            "generatedRules": {
                "svelte-stores.mdc": "---\ndescription: Svelte stores\nglobs: \"**/*.svelte\"\n---\nUse stores."
            },
            "projectStructure": "## Structure",
            "setupInstructions": "## Setup"
        })
        .to_string()
    }

    #[test]
    fn test_resolve_reply_variants() {
        let (generated, outcome) = resolve_reply(&well_formed_reply(), &request());
        assert_eq!(outcome, GenerationOutcome::Upstream);
        assert_eq!(generated.source, GenerationSource::Upstream);

        let partial = json!({ "projectStructure": "## Structure" }).to_string();
        let (generated, outcome) = resolve_reply(&partial, &request());
        assert_eq!(outcome, GenerationOutcome::Repaired);
        assert_eq!(generated.result.project_structure, "## Structure");

        let (generated, outcome) = resolve_reply("not json at all", &request());
        assert_eq!(outcome, GenerationOutcome::Fallback);
        assert_eq!(generated.source, GenerationSource::Fallback);
        assert_eq!(generated.result, synthesize(&request()));

        let (_, outcome) = resolve_reply("{\"unrelated\": true}", &request());
        assert_eq!(outcome, GenerationOutcome::Fallback);
    }

    #[test]
    fn test_placeholder_only_replies_fall_back() {
        let empty_rules = json!({ "generatedRules": {} }).to_string();
        let (generated, outcome) = resolve_reply(&empty_rules, &request());
        assert_eq!(outcome, GenerationOutcome::Fallback);
        assert_eq!(generated.source, GenerationSource::Fallback);
        assert_eq!(generated.result, synthesize(&request()));

        let headerless = json!({ "generatedRules": { "a.mdc": "no frontmatter here" } }).to_string();
        let (generated, outcome) = resolve_reply(&headerless, &request());
        assert_eq!(outcome, GenerationOutcome::Fallback);
        assert_eq!(generated.source, GenerationSource::Fallback);
        assert!(!generated.result.generated_rules.contains_key("a.mdc"));
    }

    #[test]
    fn test_one_accepted_rule_keeps_upstream_reply() {
        let reply = json!({
            "generatedRules": {
                "a.mdc": "no frontmatter here",
                "svelte-stores.mdc": "---\ndescription: Svelte stores\nglobs: \"**/*.svelte\"\n---\nUse stores."
            }
        })
        .to_string();
        let (generated, outcome) = resolve_reply(&reply, &request());
        assert_eq!(outcome, GenerationOutcome::Repaired);
        assert_eq!(generated.source, GenerationSource::Upstream);
        assert_eq!(generated.result.generated_rules.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let state = AppState::new(AppConfig::default(), PromptService::default()).unwrap();
        let err = GenerationService::new(&state)
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_sends_contract_request() {
        let upstream = spawn_upstream(UpstreamReply::completion(&well_formed_reply())).await;
        let state = state_for(&upstream.base_url, None);

        let generated = GenerationService::new(&state)
            .generate(&request())
            .await
            .unwrap();
        assert_eq!(generated.source, GenerationSource::Upstream);
        assert!(generated.result.generated_rules.contains_key("svelte-stores.mdc"));

        let sent = upstream.last_request().unwrap();
        assert_eq!(sent["model"], "gpt-4o-mini");
        assert_eq!(sent["max_tokens"], 4090);
        assert_eq!(sent["response_format"]["type"], "json_object");
        assert_eq!(sent["messages"][0]["role"], "system");
        assert!(sent["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("User wants to build: A budgeting app"));
    }

    #[tokio::test]
    async fn test_empty_reply_falls_back() {
        let upstream = spawn_upstream(UpstreamReply::status(200, r#"{"choices":[]}"#)).await;
        let state = state_for(&upstream.base_url, None);

        let generated = GenerationService::new(&state)
            .generate(&request())
            .await
            .unwrap();
        assert_eq!(generated.source, GenerationSource::Fallback);
    }

    #[tokio::test]
    async fn test_upstream_error_is_surfaced_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        let upstream = spawn_upstream(UpstreamReply::status(401, "{\"error\":\"bad key\"}")).await;
        let state = state_for(&upstream.base_url, Some(dir.path()));

        let err = GenerationService::new(&state)
            .generate(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 401, .. }));

        let log = std::fs::read_to_string(dir.path().join("llm_requests.jsonl")).unwrap();
        assert!(log.contains("\"outcome\":\"failed\""));
        assert!(log.contains("\"status_code\":401"));
        assert!(!log.contains("sk-test-key-123456"));
    }
}
