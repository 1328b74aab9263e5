//! 编排器到网关的消息通道
//!
//! 编排器不直接访问网络，所有请求都经由通道发送给网关，每条消息只有一个回复。

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::message::{GatewayMessage, GatewayReply};
use super::service::GatewayService;
use crate::translation::error::{TranslationError, TranslationResult};

/// 消息通道
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// 发送一条消息并等待回复
    async fn send_message(&self, message: GatewayMessage) -> TranslationResult<GatewayReply>;
}

type Envelope = (GatewayMessage, oneshot::Sender<GatewayReply>);

/// 进程内网关：独立任务接收消息，每条消息单独起任务处理
#[derive(Debug, Clone)]
pub struct LocalChannel {
    sender: mpsc::Sender<Envelope>,
}

impl LocalChannel {
    /// 启动网关任务，需要在 tokio 运行时中调用
    pub fn spawn(service: GatewayService) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Envelope>(16);

        tokio::spawn(async move {
            while let Some((message, reply_to)) = receiver.recv().await {
                let service = service.clone();
                tokio::spawn(async move {
                    let reply = service.handle(message).await;
                    if reply_to.send(reply).is_err() {
                        tracing::debug!("发送方已放弃等待回复");
                    }
                });
            }
            tracing::debug!("网关通道已关闭");
        });

        Self { sender }
    }
}

#[async_trait]
impl MessageChannel for LocalChannel {
    async fn send_message(&self, message: GatewayMessage) -> TranslationResult<GatewayReply> {
        let (reply_to, reply) = oneshot::channel();
        self.sender
            .send((message, reply_to))
            .await
            .map_err(|_| TranslationError::TransportError("翻譯網關已關閉".to_string()))?;
        reply
            .await
            .map_err(|_| TranslationError::TransportError("翻譯網關未回應".to_string()))
    }
}

/// 外部网关：通过 HTTP 把消息发给 `gpt-translate-gateway`
#[derive(Debug, Clone)]
pub struct HttpChannel {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpChannel {
    pub const MESSAGE_PATH: &'static str = "/runtime/message";

    pub fn new(gateway_url: &str) -> TranslationResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", gateway_url.trim_end_matches('/'), Self::MESSAGE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MessageChannel for HttpChannel {
    async fn send_message(&self, message: GatewayMessage) -> TranslationResult<GatewayReply> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| TranslationError::TransportError(format!("無法連線到翻譯網關: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::TransportError(format!(
                "翻譯網關回傳錯誤：{}",
                status
            )));
        }

        response
            .json::<GatewayReply>()
            .await
            .map_err(|e| TranslationError::TransportError(format!("無法解析網關回覆: {}", e)))
    }
}
