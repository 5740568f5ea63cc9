//! LLM 请求日志记录器
//!
//! 将每次上游生成请求记录到 JSONL 文件，便于调试和分析。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

use super::truncate_chars;
use crate::llm::{ChatOptions, LlmError};
use crate::models::GenerationRequest;

/// 日志文件名
const LOG_FILE_NAME: &str = "llm_requests.jsonl";

/// 默认保留的最大条目数
const DEFAULT_MAX_ENTRIES: usize = 1000;

/// 一次生成请求的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutcome {
    /// 上游结果校验通过
    Upstream,
    /// 上游结果部分字段被占位内容替换
    Repaired,
    /// 使用本地模板生成
    Fallback,
    /// 以错误响应结束
    Failed,
}

/// 请求日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 请求 ID
    pub request_id: String,
    /// 时间戳
    pub timestamp: DateTime<Utc>,
    /// 端点 URL
    pub endpoint: String,
    /// API 密钥（脱敏）
    pub api_key_masked: String,
    /// 模型名称
    pub model: String,
    /// 目标编辑器
    pub editor: String,
    /// 技术栈
    pub framework: String,
    pub backend: String,
    pub database: String,
    /// 项目描述预览
    pub description_preview: String,
    /// 温度参数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// 最大 token 数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// 超时时间（秒）
    pub timeout: u64,
    /// 状态
    pub status: String,
    /// 最终结果
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GenerationOutcome>,
    /// 持续时间（毫秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// 响应长度
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_length: Option<usize>,
    /// 响应预览
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
    /// 错误类型
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// HTTP 状态码
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// 请求日志记录器
pub struct RequestLogger {
    log_path: PathBuf,
    max_entries: usize,
    file: Mutex<Option<File>>,
}

impl RequestLogger {
    /// 创建新的日志记录器
    pub fn new(log_dir: &Path) -> Self {
        if let Err(e) = fs::create_dir_all(log_dir) {
            warn!("Failed to create request log dir {}: {}", log_dir.display(), e);
        }

        Self {
            log_path: log_dir.join(LOG_FILE_NAME),
            max_entries: DEFAULT_MAX_ENTRIES,
            file: Mutex::new(None),
        }
    }

    /// 设置最大保留条目数
    #[cfg(test)]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// 日志文件路径
    #[cfg(test)]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// 生成请求 ID
    pub fn generate_request_id() -> String {
        Uuid::new_v4().simple().to_string()[..8].to_string()
    }

    /// API 密钥脱敏
    pub fn mask_api_key(api_key: &str) -> String {
        let chars: Vec<char> = api_key.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }

    /// 记录请求开始
    #[allow(clippy::too_many_arguments)]
    pub fn log_request(
        &self,
        request_id: &str,
        endpoint: &str,
        api_key: &str,
        model: &str,
        request: &GenerationRequest,
        options: &ChatOptions,
        timeout: u64,
    ) -> LogEntry {
        LogEntry {
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
            api_key_masked: Self::mask_api_key(api_key),
            model: model.to_string(),
            editor: request.editor.to_string(),
            framework: request.framework.to_string(),
            backend: request.backend.to_string(),
            database: request.database.to_string(),
            description_preview: truncate_chars(&request.description, 200),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            timeout,
            status: "pending".to_string(),
            outcome: None,
            duration_ms: None,
            response_length: None,
            response_preview: None,
            error_type: None,
            error_message: None,
            status_code: None,
        }
    }

    /// 记录成功
    pub fn log_success(
        &self,
        mut entry: LogEntry,
        start_time: Instant,
        response: &str,
        outcome: GenerationOutcome,
    ) {
        entry.status = "success".to_string();
        entry.outcome = Some(outcome);
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.response_length = Some(response.len());
        entry.response_preview = Some(truncate_chars(response, 300));
        self.write_entry(&entry);
    }

    /// 记录错误
    pub fn log_error(
        &self,
        mut entry: LogEntry,
        start_time: Instant,
        error: &LlmError,
        outcome: GenerationOutcome,
    ) {
        entry.status = "error".to_string();
        entry.outcome = Some(outcome);
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.error_type = Some(error.kind().to_string());
        entry.error_message = Some(truncate_chars(&error.to_string(), 500));
        entry.status_code = error.status_code();
        self.write_entry(&entry);
    }

    /// 写入日志条目
    fn write_entry(&self, entry: &LogEntry) {
        let mut file_guard = self.file.lock();

        // 懒加载文件
        if file_guard.is_none() {
            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
            {
                Ok(f) => *file_guard = Some(f),
                Err(e) => warn!("Failed to open request log {}: {}", self.log_path.display(), e),
            }
        }

        if let Some(file) = file_guard.as_mut() {
            if let Ok(json) = serde_json::to_string(entry) {
                let _ = writeln!(file, "{}", json);
                let _ = file.flush();
            }
        }

        // 持有锁时清理，避免并发写入与截断交错
        if self.cleanup_if_needed() {
            *file_guard = None;
        }
    }

    /// 清理旧日志，返回是否重写了文件
    fn cleanup_if_needed(&self) -> bool {
        let Ok(file) = File::open(&self.log_path) else {
            return false;
        };
        let lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();

        if lines.len() <= self.max_entries {
            return false;
        }

        let keep_lines = &lines[lines.len() - self.max_entries..];
        if let Ok(mut file) = File::create(&self.log_path) {
            for line in keep_lines {
                let _ = writeln!(file, "{}", line);
            }
        }
        true
    }
}
