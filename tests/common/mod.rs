// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use markup5ever_rcdom::RcDom;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use gpt_translate::gateway::{GatewayMessage, GatewayReply, MessageChannel};
use gpt_translate::parsers::html::{html_to_dom, serialize_document};
use gpt_translate::translation::{Settings, TranslationError, TranslationResult};

/// HTML测试辅助工具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn create_test_dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8").expect("Failed to parse test HTML")
    }

    pub fn serialize(dom: &RcDom) -> String {
        let bytes = serialize_document(dom, "utf-8").expect("Failed to serialize DOM");
        String::from_utf8(bytes).expect("Serialized DOM should be UTF-8")
    }

    pub fn count_translation_blocks(html: &str) -> usize {
        html.matches("class=\"gpt-translation-block\"").count()
    }

    pub fn count_markers(html: &str) -> usize {
        html.matches("data-gpt-translation-appended=\"true\"").count()
    }

    pub fn create_article_page() -> String {
        r#"<!DOCTYPE html>
<html>
<head><title>Article</title></head>
<body>
    <h1>Hello world</h1>
    <p>First paragraph.</p>
    <ul><li>Item one</li></ul>
    <script>var ignored = "not text";</script>
</body>
</html>"#
            .to_string()
    }
}

/// 测试用设置
pub fn test_settings(api_key: &str) -> Settings {
    Settings {
        api_key: api_key.to_string(),
        ..Settings::default()
    }
}

/// 构造补全接口的成功响应
pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

/// 按顺序返回预设回复并记录收到的消息
#[derive(Default)]
pub struct MockChannel {
    replies: Mutex<VecDeque<TranslationResult<GatewayReply>>>,
    sent: Mutex<Vec<GatewayMessage>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completion(self, content: &str) -> Self {
        self.push(Ok(GatewayReply::data(completion(content))));
        self
    }

    pub fn with_reply(self, reply: TranslationResult<GatewayReply>) -> Self {
        self.push(reply);
        self
    }

    fn push(&self, reply: TranslationResult<GatewayReply>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn sent(&self) -> Vec<GatewayMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageChannel for MockChannel {
    async fn send_message(&self, message: GatewayMessage) -> TranslationResult<GatewayReply> {
        self.sent.lock().unwrap().push(message);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TranslationError::TransportError("no reply queued".to_string())))
    }
}

/// 上游收到的请求
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct UpstreamState {
    status: StatusCode,
    body: Value,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// 模拟补全接口，对每个请求返回相同的状态码和响应体
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub async fn start(status: StatusCode, body: Value) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = UpstreamState {
            status,
            body,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/v1/chat/completions", post(handle_completion))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock upstream");
        let addr = listener.local_addr().expect("Mock upstream has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}/v1/chat/completions", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle_completion(
    State(state): State<UpstreamState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { authorization, body });
    (state.status, Json(state.body.clone()))
}
