//! 应用配置管理
//!
//! 启动时加载一次配置：先读取配置文件（可选），再用环境变量覆盖。
//! 加载后的配置不可变，通过应用状态注入到各个处理器。

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;

/// API 密钥环境变量
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// 配置文件路径环境变量
const CONFIG_PATH_ENV: &str = "VIBEFORGE_CONFIG";
const BASE_URL_ENV: &str = "VIBEFORGE_BASE_URL";
const MODEL_ENV: &str = "VIBEFORGE_MODEL";
const BIND_ENV: &str = "VIBEFORGE_BIND";

/// 获取默认配置文件路径
fn default_config_path() -> PathBuf {
    // 配置文件位于可执行文件同级目录
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM API 密钥（只从环境变量读取，不写回文件）
    #[serde(skip)]
    pub api_key: String,

    /// LLM API 基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,

    /// 温度参数 (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// 最大 token 数
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// 连接超时（秒）
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// 监听地址
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// 请求日志目录，未设置时不记录
    #[serde(default)]
    pub request_log_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.4
}

fn default_max_tokens() -> u32 {
    4090
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8765))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            bind_addr: default_bind_addr(),
            request_log_dir: None,
        }
    }
}

impl AppConfig {
    /// 从配置文件和进程环境变量加载配置
    pub fn load() -> Result<Self, AppError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());

        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 从文件加载配置，文件不存在时使用默认值
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("读取配置文件失败 {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("解析配置文件失败 {}: {}", path.display(), e)))
    }

    /// 使用环境变量覆盖配置
    ///
    /// `lookup` 返回变量值，便于测试时注入
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(api_key) = lookup(API_KEY_ENV) {
            self.api_key = api_key.trim().to_string();
        }
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            self.base_url = base_url;
        }
        if let Some(model) = lookup(MODEL_ENV) {
            self.model = model;
        }
        if let Some(bind) = lookup(BIND_ENV) {
            self.bind_addr = bind
                .parse()
                .map_err(|e| AppError::Config(format!("{} 无效 ({}): {}", BIND_ENV, bind, e)))?;
        }
        Ok(())
    }

    /// 是否已配置 API 密钥
    pub fn api_key_set(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
