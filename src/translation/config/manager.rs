//! 设置存储与运行时配置
//!
//! 设置保存在 TOML 文件中，每次翻译开始时读取一次，只通过 `settings set` 写入。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::constants;
use crate::env::EnvVar;
use crate::translation::error::{TranslationError, TranslationResult};

/// 持久化的用户设置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub user_prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: constants::DEFAULT_MODEL.to_string(),
            user_prompt: constants::DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Settings {
    /// 按设置表单的规则构建设置
    ///
    /// API Key 去除首尾空白后不能为空；提示词为空时使用默认值。
    pub fn from_form(api_key: &str, model: Option<&str>, user_prompt: Option<&str>) -> TranslationResult<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(TranslationError::ConfigError(
                "請輸入有效的 API Key。".to_string(),
            ));
        }

        let settings = Self {
            api_key: api_key.to_string(),
            model: model.unwrap_or_default().to_string(),
            user_prompt: user_prompt.unwrap_or_default().trim().to_string(),
        };
        Ok(settings.normalized())
    }

    /// 空的模型和提示词回落到默认值
    pub fn normalized(mut self) -> Self {
        if self.model.trim().is_empty() {
            self.model = constants::DEFAULT_MODEL.to_string();
        }
        if self.user_prompt.trim().is_empty() {
            self.user_prompt = constants::DEFAULT_PROMPT.to_string();
        }
        self
    }

    /// 从指定文件加载；文件不存在时返回默认设置
    pub fn load_from_file(path: &Path) -> TranslationResult<Self> {
        if !path.exists() {
            tracing::debug!("设置文件不存在，使用默认设置: {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::IoError(format!("讀取設定檔失敗: {}", e)))?;
        let settings: Settings = toml::from_str(&content)
            .map_err(TranslationError::from)
            .map_err(|e| e.with_context(path.display()))?;
        Ok(settings.normalized())
    }

    /// 设置文件中没有 API Key 时，使用 `OPENAI_API_KEY`
    pub fn apply_env_overrides(&mut self) {
        use crate::env::translation;

        if self.api_key.trim().is_empty() {
            if let Ok(api_key) = translation::ApiKey::get() {
                tracing::info!("使用环境变量 {} 提供的 API Key", translation::ApiKey::NAME);
                self.api_key = api_key;
            }
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// 遮蔽后的 API Key，用于展示
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        match chars.len() {
            0 => "(未設定)".to_string(),
            n if n <= 8 => "*".repeat(n),
            n => {
                let head: String = chars[..3].iter().collect();
                let tail: String = chars[n - 4..].iter().collect();
                format!("{}…{}", head, tail)
            }
        }
    }
}

/// 设置存储，负责设置文件的读写
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 使用默认路径（可由 `GPT_TRANSLATE_SETTINGS` 覆盖）
    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    /// 解析默认设置文件路径
    pub fn default_path() -> PathBuf {
        use crate::env::translation;

        if let Ok(path) = translation::SettingsPath::get() {
            return PathBuf::from(path);
        }

        match directories::ProjectDirs::from("", "", "gpt-translate") {
            Some(dirs) => dirs.config_dir().join(constants::SETTINGS_FILE_NAME),
            None => PathBuf::from(
                shellexpand::tilde(constants::FALLBACK_SETTINGS_PATH).into_owned(),
            ),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载设置（文件 + 环境变量补位）
    pub fn load(&self) -> TranslationResult<Settings> {
        let mut settings = Settings::load_from_file(&self.path)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// 保存设置
    pub fn save(&self, settings: &Settings) -> TranslationResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| TranslationError::IoError(format!("建立設定目錄失敗: {}", e)))?;
            }
        }

        let content = toml::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)
            .map_err(|e| TranslationError::IoError(format!("儲存設定時發生錯誤: {}", e)))?;

        tracing::info!("设置已保存: {}", self.path.display());
        Ok(())
    }
}

/// 运行时配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// 每个翻译块的字符预算
    pub chunk_budget: usize,
    /// 上游补全接口
    pub api_url: String,
    /// 外部网关地址，`None` 表示使用进程内网关
    pub gateway_url: Option<String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            chunk_budget: constants::DEFAULT_CHUNK_SIZE,
            api_url: constants::DEFAULT_API_URL.to_string(),
            gateway_url: None,
        }
    }
}

impl TranslatorConfig {
    /// 从环境变量构建，未设置的项使用默认值
    pub fn from_env() -> TranslationResult<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 应用环境变量覆盖；变量存在但无效时报错
    pub fn apply_env_overrides(&mut self) -> TranslationResult<()> {
        use crate::env::translation;

        if std::env::var(translation::ChunkSize::NAME).is_ok() {
            self.chunk_budget = translation::ChunkSize::get()?;
        }

        if std::env::var(translation::ApiUrl::NAME).is_ok() {
            self.api_url = translation::ApiUrl::get()?;
            tracing::info!("环境变量覆盖 API URL: {}", self.api_url);
        }

        if std::env::var(translation::GatewayUrl::NAME).is_ok() {
            self.gateway_url = Some(translation::GatewayUrl::get()?);
        }

        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.chunk_budget == 0 {
            return Err(TranslationError::ConfigError("分塊大小不能為 0".to_string()));
        }

        url::Url::parse(&self.api_url)
            .map_err(|e| TranslationError::ConfigError(format!("API URL 無效: {}", e)))?;

        if let Some(gateway_url) = &self.gateway_url {
            url::Url::parse(gateway_url)
                .map_err(|e| TranslationError::ConfigError(format!("網關 URL 無效: {}", e)))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.model, "gpt-5");
        assert_eq!(settings.user_prompt, constants::DEFAULT_PROMPT);
        assert!(!settings.has_api_key());
    }

    #[test]
    fn test_from_form_trims_and_defaults() {
        let settings = Settings::from_form("  sk-test  ", Some("gpt-4o"), Some("   ")).unwrap();
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.user_prompt, constants::DEFAULT_PROMPT);
    }

    #[test]
    fn test_from_form_rejects_blank_key() {
        let error = Settings::from_form("   ", None, None).unwrap_err();
        assert!(matches!(error, TranslationError::ConfigError(_)));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.toml"));
        let settings = Settings::from_form("sk-roundtrip", Some("gpt-4.1"), Some("翻成繁中")).unwrap();

        store.save(&settings).unwrap();
        let loaded = Settings::load_from_file(store.path()).unwrap();

        assert_eq!(loaded, settings);
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("apiKey"));
        assert!(raw.contains("userPrompt"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "apiKey = \"sk-1\"\nmodel = \"\"\n").unwrap();

        let loaded = Settings::load_from_file(&path).unwrap();
        assert_eq!(loaded.api_key, "sk-1");
        assert_eq!(loaded.model, "gpt-5");
        assert_eq!(loaded.user_prompt, constants::DEFAULT_PROMPT);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "apiKey = [").unwrap();

        let error = Settings::load_from_file(&path).unwrap_err();
        assert!(matches!(error, TranslationError::ConfigError(_)));
    }

    #[test]
    fn test_masked_api_key() {
        let mut settings = Settings::default();
        assert_eq!(settings.masked_api_key(), "(未設定)");
        settings.api_key = "short".to_string();
        assert_eq!(settings.masked_api_key(), "*****");
        settings.api_key = "sk-1234567890abcd".to_string();
        assert_eq!(settings.masked_api_key(), "sk-…abcd");
    }

    #[test]
    fn test_config_validation() {
        assert!(TranslatorConfig::default().validate().is_ok());

        let zero = TranslatorConfig {
            chunk_budget: 0,
            ..TranslatorConfig::default()
        };
        assert!(zero.validate().is_err());

        let bad_gateway = TranslatorConfig {
            gateway_url: Some("::not a url".to_string()),
            ..TranslatorConfig::default()
        };
        assert!(bad_gateway.validate().is_err());
    }
}
