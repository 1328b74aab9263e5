//! 网关消息协议
//!
//! 请求：`{"type": "gptTranslateChunk", "payload": {"apiKey", "model", "messages"}}`
//! 回复：`{"data": <原始响应>}` 或 `{"error": "<文字>"}`（可附带 `kind` 与 `status`）

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::translation::error::{ErrorKind, TranslationError, TranslationResult};
use crate::translation::prompt::ChatMessage;

/// 翻译块请求的载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateChunkPayload {
    pub api_key: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// 发往网关的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum GatewayMessage {
    #[serde(rename = "gptTranslateChunk")]
    TranslateChunk(TranslateChunkPayload),
}

impl GatewayMessage {
    pub fn translate_chunk(api_key: &str, model: &str, messages: Vec<ChatMessage>) -> Self {
        GatewayMessage::TranslateChunk(TranslateChunkPayload {
            api_key: api_key.to_string(),
            model: model.to_string(),
            messages,
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            GatewayMessage::TranslateChunk(_) => "gptTranslateChunk",
        }
    }
}

/// 网关回复，每条消息恰好一个
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GatewayReply {
    Data {
        data: Value,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<ErrorKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
}

impl GatewayReply {
    pub fn data(data: Value) -> Self {
        GatewayReply::Data { data }
    }

    pub fn from_error(error: &TranslationError) -> Self {
        GatewayReply::Error {
            error: error.to_string(),
            kind: Some(error.kind()),
            status: error.status(),
        }
    }

    /// 不带分类的错误回复
    pub fn error(message: impl Into<String>) -> Self {
        GatewayReply::Error {
            error: message.into(),
            kind: None,
            status: None,
        }
    }

    /// 转换为结果
    pub fn into_result(self) -> TranslationResult<Value> {
        match self {
            GatewayReply::Data { data } => Ok(data),
            GatewayReply::Error {
                error,
                kind,
                status,
            } => Err(TranslationError::from_reply(kind, error, status)),
        }
    }
}
