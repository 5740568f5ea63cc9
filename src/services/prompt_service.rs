//! Prompt 构建服务
//!
//! 负责将请求字段渲染进系统/用户模板。模板在启动时构建一次，之后只读。

use super::prompts::{RULES_SYSTEM_PROMPT, RULES_USER_PROMPT};
use crate::llm::ChatMessage;
use crate::models::GenerationRequest;

/// Prompt 模板
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub system: String,
    pub user: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: RULES_SYSTEM_PROMPT.to_string(),
            user: RULES_USER_PROMPT.to_string(),
        }
    }
}

/// 渲染后的 Prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

impl RenderedPrompt {
    /// 转换为聊天消息列表
    pub fn into_messages(self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.system), ChatMessage::user(self.user)]
    }
}

/// Prompt 服务
#[derive(Debug, Clone, Default)]
pub struct PromptService {
    templates: PromptTemplates,
}

impl PromptService {
    /// 使用给定模板创建 Prompt 服务
    pub fn new(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    /// 渲染系统和用户 Prompt
    pub fn build(&self, request: &GenerationRequest) -> RenderedPrompt {
        let editor = request.editor;
        let vars = [
            ("description", request.description.as_str()),
            ("framework", request.framework.label()),
            ("backend", request.backend.label()),
            ("database", request.database.label()),
            ("editor", editor.product_name()),
            ("rule_suffix", editor.rule_suffix()),
            ("rules_dir", editor.rules_dir()),
        ];

        RenderedPrompt {
            system: render_template(&self.templates.system, &vars),
            user: render_template(&self.templates.user, &vars),
        }
    }

    /// 构建聊天消息列表
    pub fn build_chat_messages(&self, request: &GenerationRequest) -> Vec<ChatMessage> {
        self.build(request).into_messages()
    }
}

/// 单遍替换 `{name}` 占位符
///
/// 替换进来的值不会再次被解析；未知的占位符（包括 JSON 示例里的花括号）原样保留。
fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let value = after.find('}').and_then(|end| {
            let name = &after[..end];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });

        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
