//! 提示词构建
//!
//! 每个翻译块生成两条消息：系统消息说明翻译要求与 JSON 输出格式，
//! 用户消息逐行列出 `[索引] 文本`。

use serde::{Deserialize, Serialize};

use crate::translation::config::constants;
use crate::translation::pipeline::Chunk;

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// 对话消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// 为翻译块构建提示消息
pub fn build_messages(user_prompt: &str, chunk: &Chunk) -> Vec<ChatMessage> {
    let texts: Vec<&str> = chunk.blocks.iter().map(|block| block.text.as_str()).collect();
    build_messages_for_texts(user_prompt, &texts)
}

/// 以纯文本列表构建提示消息
pub fn build_messages_for_texts(user_prompt: &str, texts: &[&str]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "{} {}",
            user_prompt,
            constants::JSON_OUTPUT_INSTRUCTION
        )),
        ChatMessage::user(format!(
            "{}\n{}",
            constants::USER_MESSAGE_HEADER,
            numbered_lines(texts)
        )),
    ]
}

fn numbered_lines(texts: &[&str]) -> String {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| format!("[{}] {}", index, text))
        .collect::<Vec<_>>()
        .join("\n")
}
