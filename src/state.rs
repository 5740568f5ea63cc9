//! 应用状态管理
//!
//! 定义在请求处理器之间共享的状态。所有字段在启动时构建，之后只读；
//! 每个请求独立处理，不共享可变状态（请求日志文件句柄除外，内部加锁）。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{LlmClient, LlmError};
use crate::services::{PromptService, PromptTemplates};
use crate::utils::RequestLogger;

/// 应用共享状态
pub struct AppState {
    /// 启动时加载的配置
    pub config: Arc<AppConfig>,
    /// Prompt 模板
    pub prompts: Arc<PromptService>,
    /// LLM 客户端；未配置 API 密钥时为 None
    pub llm: Option<LlmClient>,
    /// 请求日志；未配置日志目录时为 None
    pub request_logger: Option<Arc<RequestLogger>>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(config: AppConfig, prompts: PromptService) -> Result<Self, LlmError> {
        let llm = if config.api_key_set() {
            Some(LlmClient::new(
                config.api_key.clone(),
                &config.base_url,
                config.request_timeout(),
                config.connect_timeout(),
            )?)
        } else {
            None
        };

        let request_logger = config
            .request_log_dir
            .as_deref()
            .map(|dir| Arc::new(RequestLogger::new(dir)));

        Ok(Self {
            config: Arc::new(config),
            prompts: Arc::new(prompts),
            llm,
            request_logger,
        })
    }
}

/// 创建可共享的应用状态
pub fn create_shared_state(config: AppConfig) -> Result<Arc<AppState>, LlmError> {
    let prompts = PromptService::new(PromptTemplates::default());
    Ok(Arc::new(AppState::new(config, prompts)?))
}
