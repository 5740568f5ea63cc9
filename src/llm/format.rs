//! URL 构建工具

/// 修复 base_url
///
/// - 移除末尾斜杠
/// - 修复双斜杠（保留协议部分）
pub fn fix_base_url(base_url: &str) -> String {
    let url = base_url.trim().trim_end_matches('/');

    match url.find("://") {
        Some(pos) => {
            let (protocol, rest) = url.split_at(pos + 3);
            let mut fixed_rest = rest.to_string();
            while fixed_rest.contains("//") {
                fixed_rest = fixed_rest.replace("//", "/");
            }
            format!("{}{}", protocol, fixed_rest)
        }
        None => url.to_string(),
    }
}

/// 构建 OpenAI 兼容的 Chat Completions 端点
pub fn build_chat_endpoint(base_url: &str) -> String {
    let url = fix_base_url(base_url);

    if url.ends_with("/chat/completions") {
        url
    } else if url.ends_with("/v1") {
        format!("{}/chat/completions", url)
    } else {
        format!("{}/v1/chat/completions", url)
    }
}
