//! VibeForge - Rust Backend
//!
//! 使用 axum 框架构建的后端服务，根据项目描述和技术栈生成 AI 编辑器规则文件。

use axum::{
    response::{IntoResponse, Response},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod llm;
mod models;
mod services;
mod state;
#[cfg(test)]
mod testing;
mod utils;

use api::create_api_routes;
use config::{AppConfig, API_KEY_ENV};
use error::AppError;
use state::create_shared_state;

/// 在 Windows 上设置控制台代码页为 UTF-8
#[cfg(windows)]
fn setup_console_encoding() {
    unsafe {
        extern "system" {
            fn SetConsoleOutputCP(code_page: u32) -> i32;
            fn SetConsoleCP(code_page: u32) -> i32;
        }
        SetConsoleOutputCP(65001);
        SetConsoleCP(65001);
    }
}

#[cfg(not(windows))]
fn setup_console_encoding() {}

/// 处理器 panic 时返回通用 500 响应，详情只写日志
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Request handler panicked: {}", detail);
    AppError::Internal(detail).into_response()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_console_encoding();

    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vibeforge_backend=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting VibeForge backend...");

    let config = AppConfig::load()?;
    if !config.api_key_set() {
        warn!(
            "{} is not set; /api/generate will answer 503 until it is configured",
            API_KEY_ENV
        );
    }
    info!("Model: {}, base URL: {}", config.model, config.base_url);

    let addr = config.bind_addr;
    let state = create_shared_state(config)?;

    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let app = Router::new()
        .merge(create_api_routes(Arc::clone(&state)))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("Server listening on: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
