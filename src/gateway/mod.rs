//! 翻译网关模块
//!
//! 网关是唯一访问上游补全接口、使用 API Key 的组件。编排器通过消息通道与它通信：
//!
//! - `message`: 消息与回复的线格式
//! - `upstream`: 上游接口客户端与错误信息提取
//! - `service`: 无状态的消息处理
//! - `channel`: 进程内（actor）与进程外（HTTP）两种通道
//! - `server`: 独立进程形式的网关 HTTP 服务

pub mod channel;
pub mod message;
pub mod server;
pub mod service;
pub mod upstream;

pub use channel::{HttpChannel, LocalChannel, MessageChannel};
pub use message::{GatewayMessage, GatewayReply, TranslateChunkPayload};
pub use server::{create_routes, GatewayConfig, GatewayServer};
pub use service::GatewayService;
pub use upstream::{extract_error_message, CompletionClient};
