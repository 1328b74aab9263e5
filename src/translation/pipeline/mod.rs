//! 文本处理管道模块
//!
//! 负责文本收集与分块

pub mod batch;
pub mod collector;

pub use batch::{chunk_blocks, Chunk, Chunker};
pub use collector::{collect_text_blocks, rendered_text, TextBlock};
