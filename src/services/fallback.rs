//! 本地模板生成
//!
//! 上游不可用或回复无法使用时，仅根据请求字段生成与上游相同结构的结果。
//! 纯函数：无 I/O，无随机性，同样的输入得到逐字节相同的输出。

use std::collections::BTreeMap;

use crate::models::{BackendPlatform, Database, FrontendFramework, GenerationRequest, GenerationResult, TargetEditor};

/// 规则模板
struct RuleTemplate {
    name: String,
    description: String,
    globs: &'static str,
    persona: String,
    guidelines: &'static [&'static str],
}

impl RuleTemplate {
    fn render(&self) -> String {
        let mut out = format!(
            "---\ndescription: {}\nglobs: \"{}\"\n---\n{}\n\n",
            self.description, self.globs, self.persona
        );
        for line in self.guidelines {
            out.push_str("- ");
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

const CLEAN_CODE_GUIDELINES: &[&str] = &[
    "Replace magic numbers and strings with named constants.",
    "Give variables, functions and types names that reveal intent; avoid unexplained abbreviations.",
    "Keep each function focused on one task; split functions that need a comment to explain what they do.",
    "Extract repeated logic into shared helpers instead of copying it.",
    "Keep related code together and follow consistent file and folder naming.",
    "Comment on why a decision was made, not on what the code does.",
    "Leave code cleaner than you found it; refactor as part of normal work.",
];

const SECURITY_GUIDELINES: &[&str] = &[
    "Validate and sanitize all external input at the boundary where it enters the system.",
    "Never hard-code secrets; read them from environment variables or a secrets manager.",
    "Use parameterized queries or the ORM query builder; never build queries by string concatenation.",
    "Apply least-privilege access to services, database users and API tokens.",
    "Return generic error messages to clients and log the details server-side.",
    "Keep dependencies up to date and review new packages before adding them.",
];

const GIT_WORKFLOW_GUIDELINES: &[&str] = &[
    "Write commit messages in the imperative mood with a short summary line under 72 characters.",
    "Keep each commit focused on one logical change.",
    "Create a feature branch per change and merge through a reviewed pull request.",
    "Rebase on the main branch before opening a pull request and resolve conflicts locally.",
    "Never commit secrets, build output or local environment files; keep `.gitignore` current.",
];

impl FrontendFramework {
    fn rule_globs(self) -> &'static str {
        match self {
            FrontendFramework::React => "**/*.{jsx,tsx}",
            FrontendFramework::Vue | FrontendFramework::NuxtJs => "**/*.vue",
            FrontendFramework::Angular => "src/**/*.ts",
            FrontendFramework::Svelte => "**/*.svelte",
            FrontendFramework::NextJs => "app/**/*.{ts,tsx}",
        }
    }

    fn guidelines(self) -> &'static [&'static str] {
        match self {
            FrontendFramework::React => &[
                "Write function components with hooks; do not add class components.",
                "Type component props with TypeScript interfaces.",
                "Keep state as close as possible to where it is used; lift it only when shared.",
                "Follow the rules of hooks and list every dependency in effect dependency arrays.",
                "Derive values during render instead of duplicating them in state.",
            ],
            FrontendFramework::Vue => &[
                "Use the Composition API with `<script setup lang=\"ts\">`.",
                "Extract reusable stateful logic into composables named `useXxx`.",
                "Type props with `defineProps<...>()` and emits with `defineEmits<...>()`.",
                "Use Pinia for shared state; keep component-local state in `ref`/`reactive`.",
                "Prefer computed properties over watchers for derived values.",
            ],
            FrontendFramework::Angular => &[
                "Use standalone components and explicit imports.",
                "Keep components thin; move business logic into injectable services.",
                "Use signals or RxJS observables for state and unsubscribe with `takeUntilDestroyed`.",
                "Enable strict template type checking and strict TypeScript options.",
                "Use `OnPush` change detection for presentational components.",
            ],
            FrontendFramework::Svelte => &[
                "Keep components small and pass data down through props.",
                "Use stores for state shared across components.",
                "Load route data in `+page.ts`/`+page.server.ts` load functions, not in components.",
                "Use reactive declarations for derived values instead of manual updates.",
                "Type component props and load function results with TypeScript.",
            ],
            FrontendFramework::NextJs => &[
                "Use the App Router; components are Server Components unless they need interactivity.",
                "Add `'use client'` only to components that use state, effects or browser APIs.",
                "Fetch data in Server Components or route handlers, never in client effects when avoidable.",
                "Use Server Actions for mutations and validate their input.",
                "Use `next/image` and `next/link` instead of raw `<img>` and `<a>` tags.",
            ],
            FrontendFramework::NuxtJs => &[
                "Use the Composition API with `<script setup lang=\"ts\">`.",
                "Fetch data with `useFetch` or `useAsyncData` so it works with server rendering.",
                "Place shared logic in `composables/`; rely on Nuxt auto-imports.",
                "Put server endpoints in `server/api/` and validate their input.",
                "Use `useState` or Pinia for state shared across pages.",
            ],
        }
    }

    fn source_dirs(self) -> &'static [&'static str] {
        match self {
            FrontendFramework::React => &["src/components/", "src/hooks/", "src/pages/"],
            FrontendFramework::Vue => &["src/components/", "src/composables/", "src/views/"],
            FrontendFramework::Angular => &["src/app/", "src/assets/"],
            FrontendFramework::Svelte => &["src/lib/", "src/routes/"],
            FrontendFramework::NextJs => &["app/", "components/", "lib/"],
            FrontendFramework::NuxtJs => &["pages/", "components/", "composables/"],
        }
    }
}

impl BackendPlatform {
    fn rule_globs(self) -> Option<&'static str> {
        match self {
            BackendPlatform::NodeJs => Some("server/**/*.{js,ts}"),
            BackendPlatform::Python => Some("**/*.py"),
            BackendPlatform::Go => Some("**/*.go"),
            BackendPlatform::Rust => Some("**/*.rs"),
            BackendPlatform::Php => Some("**/*.php"),
            BackendPlatform::Ruby => Some("**/*.rb"),
            BackendPlatform::FrontendOnly => None,
        }
    }

    fn guidelines(self) -> &'static [&'static str] {
        match self {
            BackendPlatform::NodeJs => &[
                "Write the server in TypeScript with `strict` enabled.",
                "Validate request bodies with a schema library (e.g. zod) before using them.",
                "Use async/await and route all errors through a central error-handling middleware.",
                "Separate routing, business logic and data access into distinct modules.",
            ],
            BackendPlatform::Python => &[
                "Follow PEP 8 and add type hints to every function signature.",
                "Validate request data with Pydantic models.",
                "Keep route handlers thin and move logic into service modules.",
                "Use `logging` instead of `print` and never swallow exceptions silently.",
            ],
            BackendPlatform::Go => &[
                "Format with `gofmt` and keep packages small with clear responsibilities.",
                "Return errors explicitly and wrap them with context using `fmt.Errorf(\"...: %w\", err)`.",
                "Pass `context.Context` as the first argument to functions that do I/O.",
                "Define interfaces where they are consumed, not where they are implemented.",
            ],
            BackendPlatform::Rust => &[
                "Return `Result` and propagate errors with `?`; avoid `unwrap()` outside tests.",
                "Model domain errors with enums and implement `std::error::Error` for them.",
                "Keep handlers thin and share state through `Arc`-wrapped application state.",
                "Run `cargo fmt` and `cargo clippy` before committing.",
            ],
            BackendPlatform::Php => &[
                "Follow PSR-12 and declare `strict_types=1` in every file.",
                "Use type declarations for parameters, return values and properties.",
                "Validate input in form requests or dedicated validators before it reaches the domain.",
                "Use dependency injection rather than static helpers for services.",
            ],
            BackendPlatform::Ruby => &[
                "Follow the community Ruby style guide and run RuboCop.",
                "Keep controllers skinny; move logic into models or service objects.",
                "Use strong parameters for all user input.",
                "Write request and model specs for every new feature.",
            ],
            BackendPlatform::FrontendOnly => &[],
        }
    }

    fn source_dirs(self) -> &'static [&'static str] {
        match self {
            BackendPlatform::NodeJs => &["server/"],
            BackendPlatform::Python => &["backend/app/"],
            BackendPlatform::Go => &["cmd/server/", "internal/"],
            BackendPlatform::Rust => &["server/src/"],
            BackendPlatform::Php => &["backend/src/"],
            BackendPlatform::Ruby => &["backend/app/"],
            BackendPlatform::FrontendOnly => &[],
        }
    }
}

impl Database {
    fn rule_globs(self) -> Option<&'static str> {
        match self {
            Database::PostgreSql | Database::MySql => Some("**/*.sql"),
            Database::MongoDb => Some("**/models/**"),
            Database::Redis => Some("**/cache/**"),
            Database::Supabase => Some("supabase/**"),
            Database::Firebase => Some("**/firebase/**"),
            Database::None => None,
        }
    }

    fn guidelines(self) -> &'static [&'static str] {
        match self {
            Database::PostgreSql => &[
                "Manage schema changes with versioned migrations; never edit the database by hand.",
                "Add indexes for columns used in joins and frequent filters.",
                "Use transactions for multi-statement writes.",
                "Use `timestamptz` for timestamps and constrain columns with `NOT NULL` where possible.",
            ],
            Database::MySql => &[
                "Manage schema changes with versioned migrations.",
                "Use the InnoDB engine and `utf8mb4` character set.",
                "Add indexes for columns used in joins and frequent filters.",
                "Use transactions for multi-statement writes.",
            ],
            Database::MongoDb => &[
                "Define a schema for every collection and validate documents against it.",
                "Design documents around the application's read patterns.",
                "Create indexes for every query pattern used in production.",
                "Avoid unbounded arrays inside documents.",
            ],
            Database::Redis => &[
                "Namespace keys with a consistent prefix such as `app:entity:id`.",
                "Set a TTL on every cache entry.",
                "Treat Redis as a cache unless persistence is explicitly configured.",
                "Avoid `KEYS` in production code; use `SCAN`.",
            ],
            Database::Supabase => &[
                "Enable Row Level Security on every table and write explicit policies.",
                "Keep the service role key on the server only.",
                "Manage schema with Supabase migrations in `supabase/migrations/`.",
                "Generate TypeScript types from the database schema.",
            ],
            Database::Firebase => &[
                "Write Firestore security rules for every collection and test them.",
                "Structure collections around query patterns and avoid deep nesting.",
                "Keep admin credentials on the server only.",
                "Use batched writes or transactions for related updates.",
            ],
            Database::None => &[],
        }
    }

    fn data_dir(self) -> Option<&'static str> {
        match self {
            Database::PostgreSql | Database::MySql => Some("db/migrations/"),
            Database::MongoDb => Some("db/models/"),
            Database::Redis => Some("cache/"),
            Database::Supabase => Some("supabase/migrations/"),
            Database::Firebase => Some("firebase/"),
            Database::None => None,
        }
    }
}

/// 根据请求生成完整结果
pub fn synthesize(request: &GenerationRequest) -> GenerationResult {
    let rules = rule_templates(request);
    let suffix = request.editor.rule_suffix();

    let mut generated_rules = BTreeMap::new();
    for rule in &rules {
        generated_rules.insert(format!("{}{}", rule.name, suffix), rule.render());
    }
    generated_rules.insert(
        format!("project-context{}", suffix),
        project_context_rule(request),
    );

    let rule_files: Vec<String> = generated_rules.keys().cloned().collect();

    GenerationResult {
        project_structure: project_structure(request, &rule_files),
        setup_instructions: setup_instructions(request.editor, &rule_files),
        generated_rules,
    }
}

fn rule_templates(request: &GenerationRequest) -> Vec<RuleTemplate> {
    let mut rules = vec![
        RuleTemplate {
            name: "clean-code-principles".to_string(),
            description: "Project-wide clean code guidelines for readable, maintainable code.".to_string(),
            globs: "**/*",
            persona: "You are a senior software engineer who values readable, maintainable code.".to_string(),
            guidelines: CLEAN_CODE_GUIDELINES,
        },
        RuleTemplate {
            name: "security-best-practices".to_string(),
            description: "Input validation, secrets handling and common vulnerability prevention.".to_string(),
            globs: "**/*",
            persona: "You are a security-minded engineer reviewing every change for vulnerabilities.".to_string(),
            guidelines: SECURITY_GUIDELINES,
        },
        RuleTemplate {
            name: "git-workflow-conventions".to_string(),
            description: "Commit message style, branching strategy and pull request workflow.".to_string(),
            globs: ".git/**,.gitignore",
            persona: "You are a maintainer who keeps the repository history clean and reviewable.".to_string(),
            guidelines: GIT_WORKFLOW_GUIDELINES,
        },
    ];

    let framework = request.framework;
    rules.push(RuleTemplate {
        name: format!("{}-conventions", framework.slug()),
        description: format!("{} conventions for components, state and data fetching.", framework),
        globs: framework.rule_globs(),
        persona: format!("You are an expert {} developer who writes idiomatic, typed UI code.", framework),
        guidelines: framework.guidelines(),
    });

    let backend = request.backend;
    if let Some(globs) = backend.rule_globs() {
        rules.push(RuleTemplate {
            name: format!("{}-backend-guidelines", backend.slug()),
            description: format!("{} server-side structure, validation and error handling.", backend),
            globs,
            persona: format!("You are an expert {} backend engineer building reliable APIs.", backend),
            guidelines: backend.guidelines(),
        });
    }

    let database = request.database;
    if let Some(globs) = database.rule_globs() {
        rules.push(RuleTemplate {
            name: format!("{}-data-access", database.slug()),
            description: format!("{} schema design and safe data access patterns.", database),
            globs,
            persona: format!("You are a database engineer experienced with {}.", database),
            guidelines: database.guidelines(),
        });
    }

    rules
}

/// 引用项目描述的上下文规则
fn project_context_rule(request: &GenerationRequest) -> String {
    format!(
        "---\ndescription: Project goals and selected technology stack.\nglobs: \"**/*\"\n---\n\
         You are working on the following project. Keep every suggestion consistent with its goals and stack.\n\n\
         ## Project Description\n{}\n\n\
         ## Technology Stack\n- Frontend Framework: {}\n- Backend Platform: {}\n- Database Solution: {}\n",
        request.description.trim(),
        request.framework,
        request.backend,
        request.database
    )
}

/// 渲染目录树
fn render_tree(root: &str, entries: &[(String, Vec<String>)]) -> String {
    let mut out = format!("{}\n", root);
    for (i, (name, children)) in entries.iter().enumerate() {
        let last = i + 1 == entries.len();
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(name);
        out.push('\n');

        let indent = if last { "    " } else { "│   " };
        for (j, child) in children.iter().enumerate() {
            out.push_str(indent);
            out.push_str(if j + 1 == children.len() { "└── " } else { "├── " });
            out.push_str(child);
            out.push('\n');
        }
    }
    out
}

fn project_structure(request: &GenerationRequest, rule_files: &[String]) -> String {
    let mut entries: Vec<(String, Vec<String>)> = vec![
        (request.editor.rules_dir().to_string(), rule_files.to_vec()),
        (
            "docs/ai_context/".to_string(),
            vec!["PROJECT_OVERVIEW.md".to_string(), "ARCHITECTURE.md".to_string()],
        ),
    ];

    let dirs = request
        .framework
        .source_dirs()
        .iter()
        .chain(request.backend.source_dirs())
        .copied()
        .chain(request.database.data_dir());
    for dir in dirs {
        entries.push((dir.to_string(), Vec::new()));
    }

    entries.push(("tests/".to_string(), Vec::new()));
    entries.push(("README.md".to_string(), Vec::new()));

    format!(
        "## Project Structure\n\n```\n{}```\n\n\
         - `{}` holds the AI rule files for {}.\n\
         - `docs/ai_context/` holds background documents you can reference in chat.\n",
        render_tree("project-root/", &entries),
        request.editor.rules_dir(),
        request.editor.product_name()
    )
}

fn setup_instructions(editor: TargetEditor, rule_files: &[String]) -> String {
    let rules_dir = editor.rules_dir();
    let file_list: String = rule_files
        .iter()
        .map(|f| format!("   - `{}{}`\n", rules_dir, f))
        .collect();

    let verify = match editor {
        TargetEditor::Cursor => {
            "Open Cursor Settings → Rules and confirm the project rules are listed. Rules whose globs match the files in context are attached automatically."
        }
        TargetEditor::Windsurf => {
            "Open the Windsurf Customizations panel → Rules and confirm the workspace rules are listed. Set the activation mode of each rule if needed."
        }
    };

    format!(
        "## Setup Instructions\n\n\
         These rules were generated from built-in templates for your stack.\n\n\
         1. Create the rules directory in your project root:\n   ```bash\n   mkdir -p {}\n   ```\n\
         2. Save each generated rule file into that directory:\n{}\
         3. {}\n\
         4. Ask the assistant to perform a typical task and check that its answers follow the rules. Edit the files to tighten or relax guidance as the project evolves.\n",
        rules_dir, file_list, verify
    )
}
