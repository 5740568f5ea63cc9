//! 数据模型

mod api;
mod stack;

pub use api::*;
pub use stack::{BackendPlatform, Database, FrontendFramework, TargetEditor};
