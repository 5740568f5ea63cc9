//! API 路由模块

mod config;
mod generate;
mod health;

pub use config::config_routes;
pub use generate::generate_routes;
pub use health::health_routes;

use axum::Router;

use crate::state::AppState;
use std::sync::Arc;

/// 创建所有 API 路由
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(config_routes())
        .merge(generate_routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::state::create_shared_state;
    use crate::testing::send_json;
    use axum::http::StatusCode;

    fn router(api_key: &str) -> Router {
        let config = AppConfig {
            api_key: api_key.to_string(),
            ..AppConfig::default()
        };
        create_api_routes(create_shared_state(config).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_ai_configuration() {
        let (status, _, body) = send_json(router(""), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["aiConfigured"], false);

        let (_, _, body) = send_json(router("sk-live"), "GET", "/api/health", None).await;
        assert_eq!(body["aiConfigured"], true);
    }

    #[tokio::test]
    async fn test_config_hides_api_key() {
        let (status, _, body) = send_json(router("sk-secret-value"), "GET", "/api/config", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["apiKeySet"], true);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert!(!body.to_string().contains("sk-secret-value"));
    }

    #[tokio::test]
    async fn test_options_lists_stack_choices() {
        let (status, _, body) = send_json(router(""), "GET", "/api/options", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["frameworks"].as_array().unwrap().contains(&"Next.js".into()));
        assert!(body["backends"].as_array().unwrap().contains(&"Frontend Only".into()));
        assert!(body["databases"].as_array().unwrap().contains(&"None".into()));
        assert_eq!(body["editors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _, _) = send_json(router(""), "GET", "/api/unknown", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_rejects_get() {
        let (status, _, _) = send_json(router(""), "GET", "/api/generate", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
