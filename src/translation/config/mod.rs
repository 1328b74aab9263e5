//! 翻译配置管理模块
//!
//! 持久化设置（API Key、模型、提示词）与运行时配置（分块预算、接口地址、网关地址）

pub mod manager;

pub use manager::{Settings, SettingsStore, TranslatorConfig};

/// 配置常量
pub mod constants {
    // 设置默认值
    pub const DEFAULT_MODEL: &str = "gpt-5";
    pub const DEFAULT_PROMPT: &str = "請幫我把下列內容翻譯成台灣慣用的繁體中文";

    // 上游接口
    pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const TEMPERATURE: f64 = 0.2;

    // 分块
    pub const DEFAULT_CHUNK_SIZE: usize = 6000;

    // 提示词
    pub const JSON_OUTPUT_INSTRUCTION: &str =
        "請使用 JSON 物件的格式輸出，key 為對應的數字索引，value 為翻譯結果，僅提供翻譯文字。";
    pub const USER_MESSAGE_HEADER: &str = "以下為需要翻譯的段落：";

    // 文档标记
    pub const TRANSLATION_BLOCK_CLASS: &str = "gpt-translation-block";
    pub const TRANSLATION_MARKER_ATTR: &str = "data-gpt-translation-appended";
    pub const STYLE_ELEMENT_ID: &str = "gpt-translation-style";
    pub const STYLE_RULES: &str = r#"
    .gpt-translation-block {
      margin-top: 0.3em;
      padding: 0.3em 0.5em;
      border-left: 3px solid #4f46e5;
      background-color: rgba(79, 70, 229, 0.08);
      font-style: italic;
    }
  "#;

    // 可翻译的块级标签
    pub const TRANSLATABLE_TAGS: &[&str] = &[
        "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote",
    ];

    // 计算可见文本时跳过的元素
    pub const NON_RENDERED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

    // 可见文本中单独成行的块级元素
    pub const BLOCK_ELEMENTS: &[&str] = &[
        "address", "article", "aside", "blockquote", "div", "dl", "dt", "dd", "figcaption",
        "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
        "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
    ];

    // 保留空白的元素
    pub const PREFORMATTED_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

    // 设置文件
    pub const SETTINGS_FILE_NAME: &str = "settings.toml";
    pub const FALLBACK_SETTINGS_PATH: &str = "~/.config/gpt-translate/settings.toml";
}
