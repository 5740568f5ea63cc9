//! 技术栈选项定义
//!
//! 前端表单中可选择的框架、后端、数据库和目标编辑器均为封闭枚举。

use serde::Serialize;
use std::fmt;

/// 为技术栈枚举生成 label / slug / 解析等通用方法
macro_rules! stack_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => ($label:literal, $slug:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// 全部可选值（与前端展示顺序一致）
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// 展示名称
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// 用于文件名的短名称
            pub fn slug(self) -> &'static str {
                match self {
                    $($name::$variant => $slug),+
                }
            }

            /// 按展示名称或短名称解析（忽略大小写和首尾空白）
            pub fn parse(value: &str) -> Option<Self> {
                let value = value.trim();
                Self::ALL.iter().copied().find(|v| {
                    v.label().eq_ignore_ascii_case(value) || v.slug().eq_ignore_ascii_case(value)
                })
            }

            /// 所有展示名称，用于错误提示
            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.label()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }
    };
}

stack_enum! {
    /// 前端框架
    FrontendFramework {
        React => ("React", "react"),
        Vue => ("Vue", "vue"),
        Angular => ("Angular", "angular"),
        Svelte => ("Svelte", "svelte"),
        NextJs => ("Next.js", "nextjs"),
        NuxtJs => ("Nuxt.js", "nuxtjs"),
    }
}

stack_enum! {
    /// 后端平台
    BackendPlatform {
        NodeJs => ("Node.js", "nodejs"),
        Python => ("Python", "python"),
        Go => ("Go", "go"),
        Rust => ("Rust", "rust"),
        Php => ("PHP", "php"),
        Ruby => ("Ruby", "ruby"),
        FrontendOnly => ("Frontend Only", "frontend-only"),
    }
}

stack_enum! {
    /// 数据库
    Database {
        PostgreSql => ("PostgreSQL", "postgresql"),
        MongoDb => ("MongoDB", "mongodb"),
        MySql => ("MySQL", "mysql"),
        Redis => ("Redis", "redis"),
        Supabase => ("Supabase", "supabase"),
        Firebase => ("Firebase", "firebase"),
        None => ("None", "none"),
    }
}

stack_enum! {
    /// 目标 AI 编辑器
    #[derive(Default)]
    TargetEditor {
        #[default]
        Cursor => ("cursor", "cursor"),
        Windsurf => ("windsurf", "windsurf"),
    }
}

impl TargetEditor {
    /// 规则文件后缀
    pub fn rule_suffix(self) -> &'static str {
        match self {
            TargetEditor::Cursor => ".mdc",
            TargetEditor::Windsurf => ".md",
        }
    }

    /// 规则文件存放目录（相对项目根目录）
    pub fn rules_dir(self) -> &'static str {
        match self {
            TargetEditor::Cursor => ".cursor/rules/",
            TargetEditor::Windsurf => ".windsurf/rules/",
        }
    }

    /// 编辑器产品名
    pub fn product_name(self) -> &'static str {
        match self {
            TargetEditor::Cursor => "Cursor",
            TargetEditor::Windsurf => "Windsurf",
        }
    }
}
