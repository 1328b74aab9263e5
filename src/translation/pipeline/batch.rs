//! 分块模块
//!
//! 把按文档顺序排列的文本块贪心地装入字符预算内的翻译块。
//!
//! ## 规则
//!
//! - 当前块非空且加入下一个文本块会超出预算时，结束当前块
//! - 单个超出预算的文本块独占一个块，不会被拒绝或截断
//! - 不产生空块，块内与块间都保持原始顺序

use super::collector::TextBlock;
use crate::translation::config::constants;

/// 一个翻译块：一次请求发送的文本块序列
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 块编号，从 1 开始
    pub id: usize,
    pub blocks: Vec<TextBlock>,
}

impl Chunk {
    pub fn new(id: usize, blocks: Vec<TextBlock>) -> Self {
        Self { id, blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// 块内文本的总字符数
    pub fn total_chars(&self) -> usize {
        self.blocks.iter().map(TextBlock::char_count).sum()
    }

    /// 生成日志用摘要
    pub fn summary(&self) -> String {
        format!(
            "Chunk#{}: {} blocks, {} chars",
            self.id,
            self.len(),
            self.total_chars()
        )
    }
}

/// 分块器
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    budget: usize,
}

impl Chunker {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// 将文本块装入翻译块
    pub fn chunk(&self, blocks: Vec<TextBlock>) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current: Vec<TextBlock> = Vec::new();
        let mut current_size = 0;

        for block in blocks {
            let block_size = block.char_count();

            if current_size + block_size > self.budget && !current.is_empty() {
                chunks.push(Chunk::new(chunks.len() + 1, std::mem::take(&mut current)));
                current_size = 0;
            }

            if block_size > self.budget {
                tracing::debug!(
                    "文本块超出预算 ({} > {})，单独成块",
                    block_size,
                    self.budget
                );
            }

            current.push(block);
            current_size += block_size;
        }

        if !current.is_empty() {
            chunks.push(Chunk::new(chunks.len() + 1, current));
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(constants::DEFAULT_CHUNK_SIZE)
    }
}

/// 便利函数：按给定预算分块
pub fn chunk_blocks(blocks: Vec<TextBlock>, budget: usize) -> Vec<Chunk> {
    Chunker::new(budget).chunk(blocks)
}
