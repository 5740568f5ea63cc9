//! 服务层模块

mod fallback;
mod generation_service;
mod normalizer;
mod prompt_service;
mod prompts;

pub use generation_service::GenerationService;
pub use prompt_service::{PromptService, PromptTemplates};
