//! 模型回复校验与规范化
//!
//! 将模型返回的文本解析为 JSON，并逐字段校验。无法使用的字段替换为固定的占位内容，
//! 保证返回给调用方的结果始终包含完整且类型正确的字段。

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use crate::models::{GenerationResult, TargetEditor};
use crate::utils::truncate_chars;

/// 项目结构字段的占位内容
pub const PROJECT_STRUCTURE_PLACEHOLDER: &str = "## Project Structure\n\n*The AI did not generate a project structure. Please check your input and try generating again.*";

/// 配置说明字段的占位内容
pub const SETUP_INSTRUCTIONS_PLACEHOLDER: &str = "## Setup Instructions\n\n*The AI did not generate setup instructions. Please check your input and try generating again.*";

/// 规则文件头部需要包含的标记
const FRONTMATTER_DELIMITER: &str = "---";
const REQUIRED_MARKERS: [&str; 2] = ["description:", "globs:"];

/// 规范化过程中发现的字段问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    /// generatedRules 缺失或不是对象
    MissingRulesObject,
    /// 文件名或内容无效，条目被丢弃
    RuleDropped(String),
    /// 文件头部无效，内容被替换为占位内容
    RuleReplaced(String),
    /// 有规则条目但全部无效
    NoValidRules,
    /// projectStructure 缺失或为空
    MissingProjectStructure,
    /// setupInstructions 缺失或为空
    MissingSetupInstructions,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::MissingRulesObject => write!(f, "generatedRules is missing or not an object"),
            FieldIssue::RuleDropped(key) => write!(f, "rule entry '{}' dropped", key),
            FieldIssue::RuleReplaced(key) => write!(f, "rule entry '{}' has invalid frontmatter", key),
            FieldIssue::NoValidRules => write!(f, "no valid rule entries"),
            FieldIssue::MissingProjectStructure => write!(f, "projectStructure is missing or empty"),
            FieldIssue::MissingSetupInstructions => write!(f, "setupInstructions is missing or empty"),
        }
    }
}

/// 规范化结果：完整的结果 + 过程中替换/丢弃的字段
#[derive(Debug, Clone)]
pub struct Normalized {
    pub result: GenerationResult,
    pub issues: Vec<FieldIssue>,
}

impl Normalized {
    /// 三个顶层字段是否都没有可用内容
    ///
    /// 规则表中没有任何原样接受的条目（为空、只有哨兵或只有占位内容）即视为不可用。
    pub fn is_unusable(&self) -> bool {
        let sentinel = self
            .issues
            .iter()
            .any(|i| matches!(i, FieldIssue::MissingRulesObject | FieldIssue::NoValidRules));
        let replaced = self
            .issues
            .iter()
            .filter(|i| matches!(i, FieldIssue::RuleReplaced(_)))
            .count();
        let rules_unusable = sentinel || self.result.generated_rules.len() <= replaced;
        rules_unusable
            && self.issues.contains(&FieldIssue::MissingProjectStructure)
            && self.issues.contains(&FieldIssue::MissingSetupInstructions)
    }
}

/// 无效原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// 不是合法 JSON
    NotJson(String),
    /// JSON 顶层不是对象
    NotAnObject,
    /// 部分字段需要修复
    FieldIssues(Vec<FieldIssue>),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::NotJson(e) => write!(f, "reply is not valid JSON: {}", e),
            InvalidReason::NotAnObject => write!(f, "reply JSON is not an object"),
            InvalidReason::FieldIssues(issues) => {
                let parts: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", parts.join("; "))
            }
        }
    }
}

/// 校验结果
#[derive(Debug, Clone)]
pub enum Validation {
    /// 所有字段均有效，结果与模型回复一致
    Valid(GenerationResult),
    /// 存在问题；能解析为对象时附带规范化后的结果
    Invalid {
        reason: InvalidReason,
        partial: Option<Normalized>,
    },
}

/// 校验模型回复文本
pub fn validate_reply(raw: &str, editor: TargetEditor) -> Validation {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(e) => {
            warn!("AI reply is not valid JSON: {}", e);
            return Validation::Invalid {
                reason: InvalidReason::NotJson(e.to_string()),
                partial: None,
            };
        }
    };

    let Some(object) = value.as_object() else {
        warn!("AI reply JSON is not an object");
        return Validation::Invalid {
            reason: InvalidReason::NotAnObject,
            partial: None,
        };
    };

    let normalized = normalize(object, editor);
    if normalized.issues.is_empty() {
        Validation::Valid(normalized.result)
    } else {
        Validation::Invalid {
            reason: InvalidReason::FieldIssues(normalized.issues.clone()),
            partial: Some(normalized),
        }
    }
}

/// 逐字段规范化已解析的回复对象
pub fn normalize(object: &Map<String, Value>, editor: TargetEditor) -> Normalized {
    let mut issues = Vec::new();

    let generated_rules = normalize_rules(object.get("generatedRules"), editor, &mut issues);

    let project_structure = match non_blank_text(object.get("projectStructure")) {
        Some(text) => text,
        None => {
            warn!("AI reply 'projectStructure' is missing or empty");
            issues.push(FieldIssue::MissingProjectStructure);
            PROJECT_STRUCTURE_PLACEHOLDER.to_string()
        }
    };

    let setup_instructions = match non_blank_text(object.get("setupInstructions")) {
        Some(text) => text,
        None => {
            warn!("AI reply 'setupInstructions' is missing or empty");
            issues.push(FieldIssue::MissingSetupInstructions);
            SETUP_INSTRUCTIONS_PLACEHOLDER.to_string()
        }
    };

    Normalized {
        result: GenerationResult {
            generated_rules,
            project_structure,
            setup_instructions,
        },
        issues,
    }
}

fn non_blank_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// 规则文件内容是否以 frontmatter 开头并包含必要字段
fn has_valid_header(content: &str) -> bool {
    content.starts_with(FRONTMATTER_DELIMITER)
        && REQUIRED_MARKERS.iter().all(|marker| content.contains(marker))
}

fn normalize_rules(
    value: Option<&Value>,
    editor: TargetEditor,
    issues: &mut Vec<FieldIssue>,
) -> BTreeMap<String, String> {
    let suffix = editor.rule_suffix();
    let mut rules = BTreeMap::new();

    let Some(entries) = value.and_then(Value::as_object) else {
        warn!("AI reply 'generatedRules' is missing, not an object, or is an array");
        issues.push(FieldIssue::MissingRulesObject);
        rules.insert(format!("error-no-rules-object{}", suffix), missing_rules_object_rule());
        return rules;
    };

    for (key, value) in entries {
        let content = value.as_str().filter(|s| !s.trim().is_empty());
        let content = match content {
            Some(content) if key.ends_with(suffix) => content,
            _ => {
                warn!(
                    "Invalid rule entry skipped: key '{}' (suffix {} required) or value is not a non-empty string",
                    key, suffix
                );
                issues.push(FieldIssue::RuleDropped(key.clone()));
                continue;
            }
        };

        if has_valid_header(content) {
            rules.insert(key.clone(), content.to_string());
        } else {
            warn!(
                "Rule content for '{}' has missing or invalid frontmatter: {}",
                key,
                truncate_chars(content, 100)
            );
            issues.push(FieldIssue::RuleReplaced(key.clone()));
            rules.insert(key.clone(), invalid_rule_placeholder(key, content));
        }
    }

    if rules.is_empty() && !entries.is_empty() {
        issues.push(FieldIssue::NoValidRules);
        rules.insert(format!("error-generating-rules{}", suffix), no_valid_rules_rule());
    }

    rules
}

/// 头部无效的规则文件占位内容
fn invalid_rule_placeholder(key: &str, original: &str) -> String {
    format!(
        r#"---
description: "Error: Invalid content structure for {key}"
globs: "**/*"
---
# Invalid Rule Content
The AI generated malformed content for this rule. A rule file must start with YAML frontmatter containing `description` and `globs`.

Original content (truncated):
{original}
"#,
        key = key,
        original = truncate_chars(original, 200)
    )
}

fn no_valid_rules_rule() -> String {
    r#"---
description: "Error: AI failed to generate any valid rule files."
globs: "**/*"
---
# Rule Generation Error
The AI response contained rule entries, but none of them were valid rule files.
Review the project description and tech stack, then try generating again.
"#
    .to_string()
}

fn missing_rules_object_rule() -> String {
    r#"---
description: "Error: AI response did not contain a valid 'generatedRules' object."
globs: "**/*"
---
# Missing Rules Object
The AI response did not provide an object for 'generatedRules'. Try generating again.
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GOOD_RULE: &str = "---\ndescription: Clean code\nglobs: \"**/*\"\n---\n- Keep functions small.";

    fn well_formed() -> Value {
        json!({
            "generatedRules": {
                "clean-code.mdc": GOOD_RULE,
                "react-components.mdc": "---\ndescription: React\nglobs: [\"**/*.tsx\"]\n---\nYou are an expert in React."
            },
            "projectStructure": "## Project Structure\n\n```\nsrc/\n```",
            "setupInstructions": "## Setup\n\n1. Create `.cursor/rules/`."
        })
    }

    fn normalize_value(value: &Value) -> Normalized {
        normalize(value.as_object().unwrap(), TargetEditor::Cursor)
    }

    fn keys(result: &GenerationResult) -> Vec<String> {
        let value = serde_json::to_value(result).unwrap();
        let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_well_formed_passes_unchanged() {
        let raw = well_formed().to_string();
        let expected: GenerationResult = serde_json::from_value(well_formed()).unwrap();

        match validate_reply(&raw, TargetEditor::Cursor) {
            Validation::Valid(result) => assert_eq!(result, expected),
            other => panic!("expected valid, got {:?}", other),
        }
    }

    #[test]
    fn test_output_always_has_contract_keys() {
        let inputs = [
            json!({}),
            json!({"generatedRules": []}),
            json!({"generatedRules": null, "projectStructure": 42, "setupInstructions": {"a": 1}}),
            well_formed(),
        ];
        for input in inputs {
            let normalized = normalize_value(&input);
            assert_eq!(
                keys(&normalized.result),
                vec!["generatedRules", "projectStructure", "setupInstructions"]
            );
            assert!(!normalized.result.project_structure.trim().is_empty());
            assert!(!normalized.result.setup_instructions.trim().is_empty());
        }
    }

    #[test]
    fn test_missing_field_only_replaces_that_field() {
        let mut input = well_formed();
        input.as_object_mut().unwrap().remove("setupInstructions");
        let expected: GenerationResult = serde_json::from_value(well_formed()).unwrap();

        let normalized = normalize_value(&input);
        assert_eq!(normalized.issues, vec![FieldIssue::MissingSetupInstructions]);
        assert_eq!(normalized.result.setup_instructions, SETUP_INSTRUCTIONS_PLACEHOLDER);
        assert_eq!(normalized.result.project_structure, expected.project_structure);
        assert_eq!(normalized.result.generated_rules, expected.generated_rules);
        assert!(!normalized.is_unusable());
    }

    #[test]
    fn test_blank_text_replaced() {
        let mut input = well_formed();
        input["projectStructure"] = json!("   \n");
        let normalized = normalize_value(&input);
        assert_eq!(normalized.result.project_structure, PROJECT_STRUCTURE_PLACEHOLDER);
    }

    #[test]
    fn test_bad_suffix_dropped_and_bad_header_replaced() {
        let mut input = well_formed();
        input["generatedRules"] = json!({
            "clean-code.mdc": GOOD_RULE,
            "notes.txt": GOOD_RULE,
            "empty.mdc": "  ",
            "numeric.mdc": 7,
            "no-header.mdc": "Just some text without frontmatter"
        });

        let normalized = normalize_value(&input);
        let rules = &normalized.result.generated_rules;

        assert_eq!(rules.len(), 2);
        assert_eq!(rules["clean-code.mdc"], GOOD_RULE);
        assert!(!rules.contains_key("notes.txt"));
        assert!(!rules.contains_key("empty.mdc"));
        assert!(!rules.contains_key("numeric.mdc"));

        let replaced = &rules["no-header.mdc"];
        assert!(replaced.starts_with("---"));
        assert!(replaced.contains("Invalid content structure for no-header.mdc"));
        assert!(replaced.contains("Just some text without frontmatter"));

        assert!(normalized.issues.contains(&FieldIssue::RuleDropped("notes.txt".into())));
        assert!(normalized.issues.contains(&FieldIssue::RuleReplaced("no-header.mdc".into())));
    }

    #[test]
    fn test_header_requires_both_markers() {
        assert!(has_valid_header(GOOD_RULE));
        assert!(!has_valid_header("---\ndescription: only\n---\nbody"));
        assert!(!has_valid_header("description: x\nglobs: y\n---"));
    }

    #[test]
    fn test_all_entries_invalid_yields_sentinel() {
        let mut input = well_formed();
        input["generatedRules"] = json!({ "a.txt": "x", "b.mdc": "" });

        let normalized = normalize_value(&input);
        let rules = &normalized.result.generated_rules;
        assert_eq!(rules.len(), 1);
        assert!(rules.contains_key("error-generating-rules.mdc"));
        assert!(normalized.issues.contains(&FieldIssue::NoValidRules));
    }

    #[test]
    fn test_empty_rules_object_has_no_sentinel() {
        let mut input = well_formed();
        input["generatedRules"] = json!({});
        let normalized = normalize_value(&input);
        assert!(normalized.result.generated_rules.is_empty());
        assert!(normalized.issues.is_empty());
    }

    #[test]
    fn test_rules_array_yields_missing_object_sentinel() {
        let mut input = well_formed();
        input["generatedRules"] = json!(["clean-code.mdc"]);
        let normalized = normalize_value(&input);
        assert!(normalized
            .result
            .generated_rules
            .contains_key("error-no-rules-object.mdc"));
        assert_eq!(normalized.issues, vec![FieldIssue::MissingRulesObject]);
    }

    #[test]
    fn test_windsurf_suffix() {
        let input = json!({
            "generatedRules": {
                "clean-code.md": GOOD_RULE,
                "clean-code.mdc": GOOD_RULE
            },
            "projectStructure": "tree",
            "setupInstructions": "steps"
        });
        let normalized = normalize(input.as_object().unwrap(), TargetEditor::Windsurf);
        let rules = &normalized.result.generated_rules;
        assert!(rules.contains_key("clean-code.md"));
        assert!(!rules.contains_key("clean-code.mdc"));
    }

    #[test]
    fn test_non_json_is_invalid_without_partial() {
        match validate_reply("Sorry, I can't help with that.", TargetEditor::Cursor) {
            Validation::Invalid {
                reason: InvalidReason::NotJson(_),
                partial: None,
            } => {}
            other => panic!("unexpected: {:?}", other),
        }
        match validate_reply("[1, 2, 3]", TargetEditor::Cursor) {
            Validation::Invalid {
                reason: InvalidReason::NotAnObject,
                partial: None,
            } => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_empty_object_is_unusable() {
        match validate_reply("{}", TargetEditor::Cursor) {
            Validation::Invalid {
                partial: Some(normalized),
                ..
            } => assert!(normalized.is_unusable()),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
