//! 网关 HTTP 服务
//!
//! 独立进程形式的网关，持有上游访问能力，对外只暴露消息端点。

use axum::{
    extract::{Json as ExtractJson, State},
    response::Json,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::channel::HttpChannel;
use super::message::GatewayReply;
use super::service::GatewayService;
use crate::env::{EnvResult, EnvVar};
use crate::translation::error::{TranslationError, TranslationResult};

/// 网关服务配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
}

impl GatewayConfig {
    /// 从环境变量创建配置
    pub fn from_env() -> EnvResult<Self> {
        use crate::env::gateway;

        Ok(Self {
            bind_addr: gateway::BindAddress::get()?,
            port: gateway::Port::get()?,
        })
    }

    /// 获取完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            tracing::warn!("Failed to load gateway config from environment: {}. Using defaults.", e);
            Self {
                bind_addr: "127.0.0.1".to_string(),
                port: 7081,
            }
        })
    }
}

/// 创建路由
pub fn create_routes(service: GatewayService) -> Router {
    Router::new()
        .route(HttpChannel::MESSAGE_PATH, post(handle_message))
        .route("/health", get(health))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn handle_message(
    State(service): State<GatewayService>,
    ExtractJson(body): ExtractJson<serde_json::Value>,
) -> Json<GatewayReply> {
    Json(service.handle_value(body).await)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// 网关服务器
pub struct GatewayServer {
    config: GatewayConfig,
    service: GatewayService,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, service: GatewayService) -> Self {
        Self { config, service }
    }

    /// 绑定地址并启动服务
    pub async fn start(self) -> TranslationResult<()> {
        let listener = TcpListener::bind(self.config.listen_address())
            .await
            .map_err(|e| {
                TranslationError::IoError(format!(
                    "Failed to bind {}: {}",
                    self.config.listen_address(),
                    e
                ))
            })?;
        self.serve(listener).await
    }

    /// 在已绑定的监听器上提供服务
    pub async fn serve(self, listener: TcpListener) -> TranslationResult<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            "Translation gateway listening on http://{} (upstream: {})",
            local_addr,
            self.service.client().api_url()
        );

        axum::serve(listener, create_routes(self.service))
            .await
            .map_err(|e| TranslationError::IoError(format!("Server error: {}", e)))
    }
}
