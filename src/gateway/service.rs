//! 网关消息处理
//!
//! 无状态：每条消息独立处理，可并发调用。

use std::sync::Arc;

use super::message::{GatewayMessage, GatewayReply};
use super::upstream::CompletionClient;
use crate::translation::error::helpers;

#[derive(Debug, Clone)]
pub struct GatewayService {
    client: Arc<CompletionClient>,
}

impl GatewayService {
    pub fn new(client: CompletionClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// 处理一条消息并给出唯一回复
    pub async fn handle(&self, message: GatewayMessage) -> GatewayReply {
        match message {
            GatewayMessage::TranslateChunk(payload) => {
                match self.client.complete(&payload).await {
                    Ok(data) => GatewayReply::data(data),
                    Err(error) => {
                        helpers::log_error(&error);
                        GatewayReply::from_error(&error)
                    }
                }
            }
        }
    }

    /// 处理未经校验的 JSON 消息；无法识别的类型返回错误回复
    pub async fn handle_value(&self, value: serde_json::Value) -> GatewayReply {
        match serde_json::from_value::<GatewayMessage>(value) {
            Ok(message) => self.handle(message).await,
            Err(e) => {
                tracing::warn!("无法识别的网关消息: {}", e);
                GatewayReply::error(format!("不支援的訊息: {}", e))
            }
        }
    }
}
