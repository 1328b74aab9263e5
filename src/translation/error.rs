//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。`Display` 输出即为展示给用户的提示文字。

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// 未设置 API Key（运行前检查，网关内部也会再检查一次）
    #[error("尚未設定 OpenAI API Key，請先執行 `gpt-translate settings set --api-key <KEY>` 進行設定。")]
    MissingCredential,

    /// 文档中没有可翻译的区块
    #[error("找不到可供翻譯的文字區塊。")]
    NoTranslatableContent,

    /// 无法连到上游接口（DNS、连接、读取失败等）
    #[error("{0}")]
    TransportError(String),

    /// 上游返回非成功状态码
    #[error("{message}")]
    UpstreamError { status: u16, message: String },

    /// 成功响应中缺少 `choices[0].message.content`
    #[error("無法從 OpenAI 取得翻譯結果")]
    EmptyCompletion,

    /// 模型输出无法解析为索引到译文的 JSON 对象
    #[error("解析翻譯結果失敗，請稍後再試。")]
    MalformedTranslation { detail: String },

    /// 配置错误
    #[error("設定錯誤：{0}")]
    ConfigError(String),

    /// 读写文件错误
    #[error("IO錯誤：{0}")]
    IoError(String),
}

impl TranslationError {
    /// 是否为运行前错误（发生时尚未进行任何网络请求）
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            TranslationError::MissingCredential | TranslationError::NoTranslatableContent
        )
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::MissingCredential => ErrorCategory::Configuration,
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::NoTranslatableContent => ErrorCategory::Content,
            TranslationError::TransportError(_) => ErrorCategory::Network,
            TranslationError::UpstreamError { .. } => ErrorCategory::Upstream,
            TranslationError::EmptyCompletion => ErrorCategory::Parsing,
            TranslationError::MalformedTranslation { .. } => ErrorCategory::Parsing,
            TranslationError::IoError(_) => ErrorCategory::Io,
        }
    }

    /// 跨网关通道传递时使用的错误种类
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslationError::MissingCredential => ErrorKind::MissingCredential,
            TranslationError::UpstreamError { .. } => ErrorKind::Upstream,
            TranslationError::EmptyCompletion => ErrorKind::EmptyCompletion,
            TranslationError::MalformedTranslation { .. } => ErrorKind::MalformedTranslation,
            _ => ErrorKind::Transport,
        }
    }

    /// 根据网关回复重建错误；没有 `kind` 的回复按传输错误处理
    pub fn from_reply(kind: Option<ErrorKind>, message: String, status: Option<u16>) -> Self {
        match kind {
            Some(ErrorKind::MissingCredential) => TranslationError::MissingCredential,
            Some(ErrorKind::Upstream) => TranslationError::UpstreamError {
                status: status.unwrap_or_default(),
                message,
            },
            Some(ErrorKind::EmptyCompletion) => TranslationError::EmptyCompletion,
            Some(ErrorKind::MalformedTranslation) => {
                TranslationError::MalformedTranslation { detail: message }
            }
            Some(ErrorKind::Transport) | None => TranslationError::TransportError(message),
        }
    }

    /// 上游状态码（仅 `UpstreamError` 有）
    pub fn status(&self) -> Option<u16> {
        match self {
            TranslationError::UpstreamError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 附加上下文，仅作用于携带自由文本的变体
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        match self {
            TranslationError::ConfigError(msg) => {
                TranslationError::ConfigError(format!("{} ({})", msg, context))
            }
            TranslationError::IoError(msg) => {
                TranslationError::IoError(format!("{} ({})", msg, context))
            }
            other => other,
        }
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Content,
    Network,
    Upstream,
    Parsing,
    Io,
}

/// 网关回复中的错误种类标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredential,
    Transport,
    Upstream,
    EmptyCompletion,
    MalformedTranslation,
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::IoError(error.to_string())
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML解析錯誤: {}", error))
    }
}

impl From<toml::ser::Error> for TranslationError {
    fn from(error: toml::ser::Error) -> Self {
        TranslationError::ConfigError(format!("TOML序列化錯誤: {}", error))
    }
}

impl From<crate::env::EnvError> for TranslationError {
    fn from(error: crate::env::EnvError) -> Self {
        TranslationError::ConfigError(error.to_string())
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        TranslationError::TransportError(error.to_string())
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按类别记录错误日志
    pub fn log_error(error: &TranslationError) {
        match error.category() {
            ErrorCategory::Configuration | ErrorCategory::Content => {
                tracing::warn!("翻译未开始: {}", error)
            }
            ErrorCategory::Network | ErrorCategory::Upstream => {
                tracing::error!("翻译请求失败: {} (status: {:?})", error, error.status())
            }
            ErrorCategory::Parsing => match error {
                TranslationError::MalformedTranslation { detail } => {
                    tracing::error!("解析翻译结果失败: {}", detail)
                }
                _ => tracing::error!("翻译结果错误: {}", error),
            },
            ErrorCategory::Io => tracing::error!("读写失败: {}", error),
        }
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建格式错误
    pub fn malformed<T: fmt::Display>(detail: T) -> TranslationError {
        TranslationError::MalformedTranslation {
            detail: detail.to_string(),
        }
    }
}
