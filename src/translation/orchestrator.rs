//! 翻译编排器
//!
//! 一次翻译运行的状态：
//!
//! ```text
//! Idle → LoadingSettings → Scanning → ChunkLoop(i) → Done | Failed
//! ```
//!
//! 翻译块严格按顺序逐个发送，每次只有一个请求在途。任何错误都会立即中止本次运行，
//! 之前的翻译块已写入的译文保留，不回滚。

use std::fmt;
use std::sync::Arc;

use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::gateway::{GatewayMessage, MessageChannel};
use crate::parsers::html::{
    append_child, create_text_element, detach, find_element_by_id, find_nodes, for_each_element,
    get_node_attr, has_class, html_name, insert_after, set_node_attr,
};
use crate::translation::config::{constants, Settings, SettingsStore};
use crate::translation::error::{helpers, ErrorCategory, TranslationError, TranslationResult};
use crate::translation::pipeline::{collect_text_blocks, Chunk, Chunker};
use crate::translation::prompt::build_messages;
use crate::translation::response::{parse_translations, unescape_newlines};

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    LoadingSettings,
    Scanning,
    ChunkLoop(usize),
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "Idle"),
            RunState::LoadingSettings => write!(f, "LoadingSettings"),
            RunState::Scanning => write!(f, "Scanning"),
            RunState::ChunkLoop(i) => write!(f, "ChunkLoop({})", i),
            RunState::Done => write!(f, "Done"),
            RunState::Failed => write!(f, "Failed"),
        }
    }
}

/// 运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub blocks_collected: usize,
    pub chunks_total: usize,
    pub chunks_completed: usize,
    pub blocks_translated: usize,
}

/// 运行失败：错误本身加上失败前的进度
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct RunFailure {
    pub error: TranslationError,
    pub report: RunReport,
}

impl RunFailure {
    /// 是否在任何网络请求和文档修改之前失败（含设置读取失败）
    pub fn is_preflight(&self) -> bool {
        self.error.is_preflight()
            || matches!(
                self.error.category(),
                ErrorCategory::Configuration | ErrorCategory::Io
            )
    }
}

/// 设置来源，每次运行开始时读取一次
#[derive(Debug, Clone)]
pub enum SettingsSource {
    /// 固定的设置
    Fixed(Settings),
    /// 从设置文件读取，两次运行之间的修改会在下一次运行生效
    Store(SettingsStore),
}

impl SettingsSource {
    pub fn load(&self) -> TranslationResult<Settings> {
        match self {
            SettingsSource::Fixed(settings) => Ok(settings.clone()),
            SettingsSource::Store(store) => store.load(),
        }
    }
}

impl From<Settings> for SettingsSource {
    fn from(settings: Settings) -> Self {
        SettingsSource::Fixed(settings)
    }
}

impl From<SettingsStore> for SettingsSource {
    fn from(store: SettingsStore) -> Self {
        SettingsSource::Store(store)
    }
}

/// 页面翻译器
pub struct PageTranslator {
    source: SettingsSource,
    model_override: Option<String>,
    chunker: Chunker,
    channel: Arc<dyn MessageChannel>,
    state: RunState,
}

impl PageTranslator {
    pub fn new(
        source: impl Into<SettingsSource>,
        chunk_budget: usize,
        channel: Arc<dyn MessageChannel>,
    ) -> Self {
        Self {
            source: source.into(),
            model_override: None,
            chunker: Chunker::new(chunk_budget),
            channel,
            state: RunState::Idle,
        }
    }

    /// 本翻译器的所有运行都使用指定模型，不写入设置
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into().trim().to_string();
        self.model_override = (!model.is_empty()).then_some(model);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn source(&self) -> &SettingsSource {
        &self.source
    }

    fn load_settings(&self) -> TranslationResult<Settings> {
        let mut settings = self.source.load()?;
        if let Some(model) = &self.model_override {
            settings.model = model.clone();
        }
        Ok(settings)
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!("{} → {}", self.state, next);
        self.state = next;
    }

    /// 翻译整份文档，直接修改传入的 DOM
    pub async fn translate_document(&mut self, dom: &RcDom) -> Result<RunReport, RunFailure> {
        let mut report = RunReport::default();
        match self.run(dom, &mut report).await {
            Ok(()) => {
                self.transition(RunState::Done);
                tracing::info!(
                    "翻译完成: {}/{} 个块, {} 个文本块已翻译",
                    report.chunks_completed,
                    report.chunks_total,
                    report.blocks_translated
                );
                Ok(report)
            }
            Err(error) => {
                self.transition(RunState::Failed);
                helpers::log_error(&error);
                Err(RunFailure { error, report })
            }
        }
    }

    async fn run(&mut self, dom: &RcDom, report: &mut RunReport) -> TranslationResult<()> {
        self.transition(RunState::LoadingSettings);
        let settings = self.load_settings()?;
        if !settings.has_api_key() {
            return Err(TranslationError::MissingCredential);
        }

        ensure_style_injected(dom);
        clear_previous_translations(dom);

        self.transition(RunState::Scanning);
        let blocks = collect_text_blocks(&dom.document);
        if blocks.is_empty() {
            return Err(TranslationError::NoTranslatableContent);
        }
        report.blocks_collected = blocks.len();

        let chunks = self.chunker.chunk(blocks);
        report.chunks_total = chunks.len();
        tracing::info!(
            "共 {} 个文本块，分为 {} 个翻译块",
            report.blocks_collected,
            report.chunks_total
        );

        for (index, chunk) in chunks.iter().enumerate() {
            self.transition(RunState::ChunkLoop(index));
            let translations = self.translate_chunk(&settings, chunk).await?;
            report.blocks_translated += apply_translations(dom, chunk, &translations);
            report.chunks_completed += 1;
        }

        Ok(())
    }

    /// 发送一个翻译块并解析回复
    async fn translate_chunk(
        &self,
        settings: &Settings,
        chunk: &Chunk,
    ) -> TranslationResult<Vec<Option<String>>> {
        tracing::debug!("发送 {}", chunk.summary());

        let messages = build_messages(&settings.user_prompt, chunk);
        let message = GatewayMessage::translate_chunk(&settings.api_key, &settings.model, messages);

        let raw = self.channel.send_message(message).await?.into_result()?;
        parse_translations(&raw, chunk.len())
    }
}

/// 在 `<head>` 中注入译文样式，每个文档只注入一次
pub fn ensure_style_injected(dom: &RcDom) {
    if find_element_by_id(&dom.document, constants::STYLE_ELEMENT_ID).is_some() {
        return;
    }

    let Some(head) = find_nodes(&dom.document, &["html", "head"]).into_iter().next() else {
        tracing::warn!("文档没有 <head>，跳过样式注入");
        return;
    };

    let style = create_text_element(
        dom,
        html_name("style"),
        vec![("id", constants::STYLE_ELEMENT_ID)],
        constants::STYLE_RULES,
    );
    append_child(dom, &head, style);
}

/// 移除所有译文块并清除源元素上的标记
pub fn clear_previous_translations(dom: &RcDom) {
    let mut translation_blocks: Vec<Handle> = Vec::new();
    let mut marked: Vec<Handle> = Vec::new();

    for_each_element(&dom.document, &mut |node| {
        if has_class(node, constants::TRANSLATION_BLOCK_CLASS) {
            translation_blocks.push(node.clone());
        }
        if get_node_attr(node, constants::TRANSLATION_MARKER_ATTR).is_some() {
            marked.push(node.clone());
        }
    });

    if !translation_blocks.is_empty() {
        tracing::debug!("清除 {} 个旧译文块", translation_blocks.len());
    }

    for node in &translation_blocks {
        detach(dom, node);
    }
    for node in &marked {
        set_node_attr(node, constants::TRANSLATION_MARKER_ATTR, None);
    }
}

/// 把一个翻译块的译文写入文档，返回写入的数量
///
/// 先收集所有待插入的节点，再统一插入。
pub fn apply_translations(dom: &RcDom, chunk: &Chunk, translations: &[Option<String>]) -> usize {
    let pending: Vec<(&Handle, Handle)> = chunk
        .blocks
        .iter()
        .zip(translations)
        .filter_map(|(block, translation)| {
            let translation = translation.as_deref()?;
            let NodeData::Element { ref name, .. } = block.node.data else {
                return None;
            };
            let element = create_text_element(
                dom,
                name.clone(),
                vec![("class", constants::TRANSLATION_BLOCK_CLASS)],
                &unescape_newlines(translation),
            );
            Some((&block.node, element))
        })
        .collect();

    let mut applied = 0;
    for (source, element) in pending {
        if insert_after(dom, source, element) {
            set_node_attr(
                source,
                constants::TRANSLATION_MARKER_ATTR,
                Some("true".to_string()),
            );
            applied += 1;
        } else {
            tracing::warn!("源元素已脱离文档，跳过译文插入");
        }
    }
    applied
}
