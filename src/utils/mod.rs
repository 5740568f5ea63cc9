//! 通用工具

mod request_logger;

pub use request_logger::{GenerationOutcome, RequestLogger};

/// 按字符截断字符串，超出部分以 "..." 结尾
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
