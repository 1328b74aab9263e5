//! 文本收集器模块
//!
//! 按文档顺序收集可翻译的块级元素及其可见文本

use std::sync::OnceLock;

use markup5ever_rcdom::{Handle, NodeData};
use regex::Regex;

use crate::parsers::html::{get_node_name, has_class};
use crate::translation::config::constants;

/// 一个待翻译的文本块
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// 源元素（共享引用，不拷贝节点）
    pub node: Handle,
    /// 扫描时的可见文本（已去除首尾空白）
    pub text: String,
}

impl TextBlock {
    pub fn new(node: Handle, text: String) -> Self {
        Self { node, text }
    }

    /// 获取文本字符数
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// 源元素标签名
    pub fn tag_name(&self) -> Option<&str> {
        get_node_name(&self.node)
    }
}

/// 收集文档中所有可翻译的文本块
///
/// 匹配 `p`、`h1`–`h6`、`li`、`blockquote`，跳过已经是译文块的元素和空文本。
/// 只读，不修改文档。嵌套的匹配元素会各自成为一个文本块。
pub fn collect_text_blocks(document: &Handle) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    collect_recursive(document, &mut blocks);
    tracing::debug!("收集到 {} 个文本块", blocks.len());
    blocks
}

fn collect_recursive(node: &Handle, blocks: &mut Vec<TextBlock>) {
    if let NodeData::Element { ref name, .. } = node.data {
        let tag_name: &str = &name.local;

        if constants::NON_RENDERED_ELEMENTS.contains(&tag_name) {
            return;
        }

        if constants::TRANSLATABLE_TAGS.contains(&tag_name)
            && !has_class(node, constants::TRANSLATION_BLOCK_CLASS)
        {
            let text = rendered_text(node);
            if !text.is_empty() {
                blocks.push(TextBlock::new(node.clone(), text));
            }
        }
    }

    for child in node.children.borrow().iter() {
        collect_recursive(child, blocks);
    }
}

/// 计算元素的可见文本（近似浏览器的 innerText）
///
/// 跳过脚本、样式等不渲染的内容；`<br>` 与块级元素边界产生换行；
/// 普通文本中的连续空白折叠为一个空格，预格式化元素内保留原样。
pub fn rendered_text(node: &Handle) -> String {
    let mut out = String::new();
    push_rendered(node, &mut out, false);
    normalize_line_breaks(&out)
}

fn push_rendered(node: &Handle, out: &mut String, preformatted: bool) {
    match node.data {
        NodeData::Text { ref contents } => {
            let contents = contents.borrow();
            if preformatted {
                out.push_str(&contents);
            } else {
                push_collapsed(out, &contents);
            }
        }
        NodeData::Element { ref name, .. } => {
            let tag_name: &str = &name.local;

            if constants::NON_RENDERED_ELEMENTS.contains(&tag_name) {
                return;
            }
            if tag_name == "br" {
                out.push('\n');
                return;
            }

            let is_block = constants::BLOCK_ELEMENTS.contains(&tag_name);
            let preformatted =
                preformatted || constants::PREFORMATTED_ELEMENTS.contains(&tag_name);

            if is_block {
                push_line_break(out);
            }
            for child in node.children.borrow().iter() {
                push_rendered(child, out, preformatted);
            }
            if is_block {
                push_line_break(out);
            }
        }
        _ => {
            for child in node.children.borrow().iter() {
                push_rendered(child, out, preformatted);
            }
        }
    }
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\r\n\x0C]+").expect("valid whitespace pattern"))
}

fn line_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]*\n[ \t]*").expect("valid line break pattern"))
}

fn push_collapsed(out: &mut String, text: &str) {
    let collapsed = whitespace_re().replace_all(text, " ");
    let collapsed = if out.is_empty() || out.ends_with(' ') || out.ends_with('\n') {
        collapsed.trim_start_matches(' ')
    } else {
        collapsed.as_ref()
    };
    out.push_str(collapsed);
}

fn push_line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn normalize_line_breaks(text: &str) -> String {
    line_break_re().replace_all(text, "\n").trim().to_string()
}
