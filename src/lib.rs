//! # GPT Translate
//!
//! 把网页中的段落、标题、列表项等文本块交给 GPT 翻译为台湾惯用的繁体中文，
//! 并把译文作为同类元素插入到原文之后。
//!
//! ## 模块组织
//!
//! - `env` - 环境变量定义
//! - `parsers` - HTML 解析、DOM 操作与序列化
//! - `translation` - 文本收集、分块、提示词、回复解析与运行编排
//! - `gateway` - 持有 API Key 访问上游接口的翻译网关及其消息通道

pub mod env;
pub mod gateway;
pub mod parsers;
pub mod translation;

pub use translation::{PageTranslator, RunFailure, RunReport, Settings, TranslationError};
