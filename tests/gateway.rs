//! 翻译网关集成测试
//!
//! 使用本地模拟的补全接口测试上游客户端、网关服务和两种消息通道

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use gpt_translate::gateway::{
    CompletionClient, GatewayConfig, GatewayMessage, GatewayServer, GatewayService, HttpChannel,
    LocalChannel, MessageChannel,
};
use gpt_translate::translation::prompt::build_messages_for_texts;
use gpt_translate::translation::{PageTranslator, TranslationError};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{completion, test_settings, HtmlTestHelper, MockUpstream};

fn chunk_message(api_key: &str) -> GatewayMessage {
    GatewayMessage::translate_chunk(
        api_key,
        "gpt-5",
        build_messages_for_texts("請翻譯", &["Hello"]),
    )
}

/// 启动网关服务，返回其地址
async fn start_gateway(upstream_url: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = CompletionClient::new(upstream_url).unwrap();
    let server = GatewayServer::new(GatewayConfig::default(), GatewayService::new(client));
    tokio::spawn(async move {
        server.serve(listener).await.ok();
    });
    format!("http://{}", addr)
}

/// 测试上游请求的格式
#[tokio::test]
async fn test_upstream_request_shape() {
    let upstream = MockUpstream::start(StatusCode::OK, completion(r#"{"0":"哈囉"}"#)).await;
    let client = CompletionClient::new(upstream.url()).unwrap();

    let GatewayMessage::TranslateChunk(payload) = chunk_message(" sk-test ");
    let data = client.complete(&payload).await.expect("Completion should succeed");
    assert_eq!(data["choices"][0]["message"]["content"], r#"{"0":"哈囉"}"#);

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(request.body["model"], "gpt-5");
    assert_eq!(request.body["temperature"], json!(0.2));
    assert_eq!(request.body["messages"][0]["role"], "system");
    assert_eq!(request.body["messages"][1]["role"], "user");
    assert_eq!(
        request.body["messages"][1]["content"],
        "以下為需要翻譯的段落：\n[0] Hello"
    );
    assert!(request.body.get("stream").is_none());

    println!("✅ Upstream request shape test passed");
}

/// 测试上游错误信息的提取
#[tokio::test]
async fn test_upstream_rate_limit_message() {
    let upstream = MockUpstream::start(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "rate limited" } }),
    )
    .await;
    let client = CompletionClient::new(upstream.url()).unwrap();

    let GatewayMessage::TranslateChunk(payload) = chunk_message("sk-test");
    let error = client.complete(&payload).await.unwrap_err();

    assert_eq!(
        error,
        TranslationError::UpstreamError {
            status: 429,
            message: "rate limited".to_string(),
        }
    );
    assert_eq!(error.to_string(), "rate limited");
}

/// 启动只返回一次截断响应的上游：声明的长度大于实际发送的响应体
async fn start_truncated_upstream(status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };

        // 读完请求头和请求体再回复
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let Ok(n) = socket.read(&mut buf).await else {
                return;
            };
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{{\"error\":",
            status_line
        );
        socket.write_all(response.as_bytes()).await.ok();
        socket.shutdown().await.ok();
    });
    format!("http://{}/v1/chat/completions", addr)
}

/// 测试响应体不完整时仍按状态码给出上游错误
#[tokio::test]
async fn test_unreadable_error_body_falls_back_to_status() {
    let url = start_truncated_upstream("429 Too Many Requests").await;
    let client = CompletionClient::new(url).unwrap();

    let GatewayMessage::TranslateChunk(payload) = chunk_message("sk-test");
    let error = client.complete(&payload).await.unwrap_err();

    assert_eq!(
        error,
        TranslationError::UpstreamError {
            status: 429,
            message: "OpenAI API 回傳錯誤：429 Too Many Requests".to_string(),
        }
    );
}

/// 测试网关在没有 API Key 时不访问上游
#[tokio::test]
async fn test_gateway_rejects_missing_key_without_request() {
    let upstream = MockUpstream::start(StatusCode::OK, completion("{}")).await;
    let service = GatewayService::new(CompletionClient::new(upstream.url()).unwrap());

    let reply = service.handle(chunk_message("  ")).await;
    assert_eq!(
        reply.into_result().unwrap_err(),
        TranslationError::MissingCredential
    );
    assert!(upstream.requests().is_empty());
}

/// 测试进程内通道的端到端翻译
#[tokio::test]
async fn test_local_channel_end_to_end() {
    let upstream = MockUpstream::start(StatusCode::OK, completion(r#"{"0":"哈囉"}"#)).await;
    let service = GatewayService::new(CompletionClient::new(upstream.url()).unwrap());
    let channel = Arc::new(LocalChannel::spawn(service));

    let dom = HtmlTestHelper::create_test_dom("<p>Hello</p>");
    let mut translator = PageTranslator::new(test_settings("sk-local"), 6000, channel);
    let report = translator.translate_document(&dom).await.unwrap();
    assert_eq!(report.blocks_translated, 1);

    let html = HtmlTestHelper::serialize(&dom);
    assert!(html.contains(r#"<p class="gpt-translation-block">哈囉</p>"#));
    assert_eq!(
        upstream.requests()[0].authorization.as_deref(),
        Some("Bearer sk-local")
    );
}

/// 测试上游错误经过进程内通道后原样呈现
#[tokio::test]
async fn test_local_channel_surfaces_upstream_error() {
    let upstream = MockUpstream::start(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "rate limited" } }),
    )
    .await;
    let service = GatewayService::new(CompletionClient::new(upstream.url()).unwrap());
    let channel = Arc::new(LocalChannel::spawn(service));

    let dom = HtmlTestHelper::create_test_dom("<p>Hello</p>");
    let mut translator = PageTranslator::new(test_settings("sk-test"), 6000, channel);
    let failure = translator.translate_document(&dom).await.unwrap_err();

    assert_eq!(failure.to_string(), "rate limited");
    assert_eq!(failure.error.status(), Some(429));
    assert_eq!(
        HtmlTestHelper::count_translation_blocks(&HtmlTestHelper::serialize(&dom)),
        0
    );
}

/// 测试通过独立网关服务的端到端翻译
#[tokio::test]
async fn test_http_channel_end_to_end() {
    let upstream = MockUpstream::start(StatusCode::OK, completion(r#"{"0":"哈囉"}"#)).await;
    let gateway_url = start_gateway(upstream.url()).await;
    let channel = Arc::new(HttpChannel::new(&gateway_url).unwrap());

    let dom = HtmlTestHelper::create_test_dom("<p>Hello</p>");
    let mut translator = PageTranslator::new(test_settings("sk-http"), 6000, channel);
    translator.translate_document(&dom).await.unwrap();

    let html = HtmlTestHelper::serialize(&dom);
    assert!(html.contains(
        r#"<p data-gpt-translation-appended="true">Hello</p><p class="gpt-translation-block">哈囉</p>"#
    ));
    assert_eq!(
        upstream.requests()[0].authorization.as_deref(),
        Some("Bearer sk-http")
    );

    println!("✅ HTTP gateway end-to-end test passed");
}

/// 测试上游错误经过 HTTP 网关后保留种类和状态码
#[tokio::test]
async fn test_http_channel_preserves_error_kind() {
    let upstream = MockUpstream::start(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "rate limited" } }),
    )
    .await;
    let gateway_url = start_gateway(upstream.url()).await;
    let channel = HttpChannel::new(&gateway_url).unwrap();

    let reply = channel.send_message(chunk_message("sk-test")).await.unwrap();
    assert_eq!(
        reply.into_result().unwrap_err(),
        TranslationError::UpstreamError {
            status: 429,
            message: "rate limited".to_string(),
        }
    );
}

/// 测试网关拒绝未知消息
#[tokio::test]
async fn test_gateway_rejects_unknown_message() {
    let upstream = MockUpstream::start(StatusCode::OK, completion("{}")).await;
    let gateway_url = start_gateway(upstream.url()).await;

    let reply: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/runtime/message", gateway_url))
        .json(&json!({ "type": "somethingElse", "payload": {} }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let error = reply["error"].as_str().expect("Reply should carry an error");
    assert!(error.starts_with("不支援的訊息"));
    assert!(upstream.requests().is_empty());

    let health: serde_json::Value = reqwest::get(format!("{}/health", gateway_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
}
