//! 翻译模块
//!
//! 把 HTML 文档中的文本块翻译为繁体中文，并把译文插入到原文之后：
//! - **config**: 持久化设置与运行时配置
//! - **pipeline**: 文本块收集与分块
//! - **prompt**: 构造补全请求的消息
//! - **response**: 解析补全回复
//! - **orchestrator**: 一次完整翻译运行的编排
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gpt_translate::gateway::{CompletionClient, GatewayService, LocalChannel};
//! use gpt_translate::parsers::html::html_to_dom;
//! use gpt_translate::translation::{PageTranslator, SettingsStore, TranslatorConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranslatorConfig::from_env()?;
//! let channel = LocalChannel::spawn(GatewayService::new(CompletionClient::new(&config.api_url)?));
//!
//! let dom = html_to_dom(b"<p>Hello</p>", "utf-8")?;
//! // 每次运行开始时重新读取设置文件
//! let store = SettingsStore::open_default();
//! let mut translator = PageTranslator::new(store, config.chunk_budget, Arc::new(channel));
//! let report = translator.translate_document(&dom).await?;
//! println!("{} blocks translated", report.blocks_translated);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod response;

pub use config::{constants, Settings, SettingsStore, TranslatorConfig};
pub use error::{ErrorCategory, ErrorKind, TranslationError, TranslationResult};
pub use orchestrator::{PageTranslator, RunFailure, RunReport, RunState, SettingsSource};
pub use pipeline::{collect_text_blocks, Chunk, Chunker, TextBlock};
pub use prompt::{build_messages, ChatMessage, Role};
pub use response::parse_translations;
