//! 上游补全接口客户端
//!
//! 网关中唯一直接访问网络的部分。每个请求一次非流式 POST，不重试。

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use super::message::TranslateChunkPayload;
use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::prompt::ChatMessage;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
}

/// 补全接口客户端，不保存请求之间的状态
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    api_url: String,
}

impl CompletionClient {
    pub fn new(api_url: impl Into<String>) -> TranslationResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gpt-translate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, api_url))
    }

    pub fn with_client(http: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// 发送补全请求，成功时返回解析后的响应体
    pub async fn complete(&self, payload: &TranslateChunkPayload) -> TranslationResult<Value> {
        if payload.api_key.trim().is_empty() {
            return Err(TranslationError::MissingCredential);
        }

        let request = CompletionRequest {
            model: &payload.model,
            messages: &payload.messages,
            temperature: constants::TEMPERATURE,
        };

        tracing::debug!(
            "POST {} (model: {}, messages: {})",
            self.api_url,
            payload.model,
            payload.messages.len()
        );

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(payload.api_key.trim())
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslationError::TransportError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // 响应体读取失败时仍按状态码报错
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(status, &body);
            tracing::warn!("上游返回错误 {}: {}", status, message);
            return Err(TranslationError::UpstreamError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TranslationError::TransportError(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| {
            TranslationError::TransportError(format!("無法解析 OpenAI 回應: {}", e))
        })
    }
}

/// 从失败响应中提取可读的错误信息
///
/// 依次尝试 `error.message`、顶层 `message`、原始响应文本，最后使用状态码。
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let non_blank = |m: &&str| !m.trim().is_empty();
        let nested = json
            .pointer("/error/message")
            .and_then(Value::as_str)
            .filter(non_blank);
        let top_level = json.get("message").and_then(Value::as_str).filter(non_blank);
        if let Some(message) = nested.or(top_level) {
            return message.to_string();
        }
    }

    let raw = body.trim();
    if !raw.is_empty() {
        return raw.to_string();
    }

    format!("OpenAI API 回傳錯誤：{}", status)
}
