//! LLM 模块
//!
//! 提供 OpenAI 兼容接口的客户端。

mod client;
mod format;
mod openai;
mod types;

pub use client::LlmClient;
pub use types::*;
