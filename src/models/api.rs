//! REST API 请求/响应模型

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::stack::{BackendPlatform, Database, FrontendFramework, TargetEditor};
use crate::error::AppError;

/// 缺少必填字段时的提示
pub const MISSING_FIELDS_MESSAGE: &str =
    "Project description, framework, backend, and database selections are all required.";

/// 生成请求（原始请求体）
///
/// 所有字段都是可选的，以便缺失字段时返回统一的 400 错误，而不是反序列化失败。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub description: Option<String>,
    pub framework: Option<String>,
    pub backend: Option<String>,
    pub database: Option<String>,
    pub ide: Option<String>,
}

/// 校验后的生成请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub description: String,
    pub framework: FrontendFramework,
    pub backend: BackendPlatform,
    pub database: Database,
    pub editor: TargetEditor,
}

/// 取出非空字段
fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn unsupported(field: &str, value: &str, expected: Vec<&'static str>) -> AppError {
    AppError::BadRequest(format!(
        "Unsupported {} '{}'. Expected one of: {}.",
        field,
        value.trim(),
        expected.join(", ")
    ))
}

impl TryFrom<GenerateRequest> for GenerationRequest {
    type Error = AppError;

    fn try_from(req: GenerateRequest) -> Result<Self, Self::Error> {
        let (Some(description), Some(framework), Some(backend), Some(database)) = (
            required(req.description.as_deref()),
            required(req.framework.as_deref()),
            required(req.backend.as_deref()),
            required(req.database.as_deref()),
        ) else {
            return Err(AppError::BadRequest(MISSING_FIELDS_MESSAGE.to_string()));
        };

        let framework = FrontendFramework::parse(framework)
            .ok_or_else(|| unsupported("framework", framework, FrontendFramework::labels()))?;
        let backend = BackendPlatform::parse(backend)
            .ok_or_else(|| unsupported("backend", backend, BackendPlatform::labels()))?;
        let database = Database::parse(database)
            .ok_or_else(|| unsupported("database", database, Database::labels()))?;

        // ide 为可选字段，缺省为 cursor
        let editor = match required(req.ide.as_deref()) {
            Some(ide) => TargetEditor::parse(ide)
                .ok_or_else(|| unsupported("ide", ide, TargetEditor::labels()))?,
            None => TargetEditor::default(),
        };

        Ok(Self {
            description: description.to_string(),
            framework,
            backend,
            database,
            editor,
        })
    }
}

/// 生成结果
///
/// 每个字段在返回给调用方时都必然存在且类型正确。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// 规则文件名 -> 文件内容
    pub generated_rules: BTreeMap<String, String>,
    /// 项目结构（Markdown）
    pub project_structure: String,
    /// 配置说明（Markdown）
    pub setup_instructions: String,
}

/// 编辑器选项
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOption {
    pub id: TargetEditor,
    pub name: &'static str,
    pub rule_suffix: &'static str,
    pub rules_dir: &'static str,
}

/// 表单可选项响应
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub frameworks: &'static [FrontendFramework],
    pub backends: &'static [BackendPlatform],
    pub databases: &'static [Database],
    pub editors: Vec<EditorOption>,
}

impl OptionsResponse {
    pub fn new() -> Self {
        Self {
            frameworks: FrontendFramework::ALL,
            backends: BackendPlatform::ALL,
            databases: Database::ALL,
            editors: TargetEditor::ALL
                .iter()
                .map(|&editor| EditorOption {
                    id: editor,
                    name: editor.product_name(),
                    rule_suffix: editor.rule_suffix(),
                    rules_dir: editor.rules_dir(),
                })
                .collect(),
        }
    }
}

impl Default for OptionsResponse {
    fn default() -> Self {
        Self::new()
    }
}
