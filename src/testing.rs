//! 测试辅助：本地模拟的 Chat Completions 上游服务

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 模拟上游的固定回复
#[derive(Clone)]
pub struct UpstreamReply {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

impl UpstreamReply {
    /// 200 响应，消息内容为 `content`
    pub fn completion(content: &str) -> Self {
        let body = json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        });
        Self::status(200, &body.to_string())
    }

    /// 任意状态码和原始响应体
    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    /// 延迟返回
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

struct Shared {
    reply: UpstreamReply,
    hits: AtomicUsize,
    requests: Mutex<Vec<Value>>,
}

/// 运行中的模拟上游
pub struct FakeUpstream {
    pub base_url: String,
    shared: Arc<Shared>,
}

impl FakeUpstream {
    /// 收到的请求数
    pub fn hits(&self) -> usize {
        self.shared.hits.load(Ordering::SeqCst)
    }

    /// 最近一次请求体
    pub fn last_request(&self) -> Option<Value> {
        self.shared.requests.lock().last().cloned()
    }
}

async fn handle_completion(State(shared): State<Arc<Shared>>, body: String) -> impl IntoResponse {
    shared.hits.fetch_add(1, Ordering::SeqCst);
    shared
        .requests
        .lock()
        .push(serde_json::from_str(&body).unwrap_or(Value::Null));

    if let Some(delay) = shared.reply.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(shared.reply.status).unwrap_or(StatusCode::OK);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        shared.reply.body.clone(),
    )
}

/// 在随机本地端口启动模拟上游
pub async fn spawn_upstream(reply: UpstreamReply) -> FakeUpstream {
    let shared = Arc::new(Shared {
        reply,
        hits: AtomicUsize::new(0),
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/v1/chat/completions", post(handle_completion))
        .with_state(Arc::clone(&shared));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeUpstream {
        base_url: format!("http://{}", addr),
        shared,
    }
}

/// 通过 oneshot 调用路由并解析 JSON 响应体
pub async fn send_json(
    router: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, value)
}
