//! 模型响应解析
//!
//! 从补全响应中取出第一条消息内容，截取其中第一个 `{` 到最后一个 `}` 之间的
//! JSON 对象，再按块内索引取出译文。缺失的索引不会报错，对应文本块保持未翻译。

use serde_json::Value;

use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 解析模型响应，返回与块内索引一一对应的译文
pub fn parse_translations(raw: &Value, block_count: usize) -> TranslationResult<Vec<Option<String>>> {
    let content = extract_content(raw)?;
    let translations = extract_json_object(content)?;

    Ok((0..block_count)
        .map(|index| lookup_translation(&translations, index))
        .collect())
}

/// 取出 `choices[0].message.content`
pub fn extract_content(raw: &Value) -> TranslationResult<&str> {
    raw.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .ok_or(TranslationError::EmptyCompletion)
}

/// 截取并解析内容中的 JSON 对象
pub fn extract_json_object(content: &str) -> TranslationResult<Value> {
    let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) else {
        return Err(helpers::malformed(format!("找不到 JSON 物件: {}", content)));
    };

    if end < start {
        return Err(helpers::malformed(format!("大括號順序錯誤: {}", content)));
    }

    serde_json::from_str(&content[start..=end])
        .map_err(|e| helpers::malformed(format!("{}: {}", e, content)))
}

/// 按索引查找译文（JSON 对象的键总是字符串）
fn lookup_translation(translations: &Value, index: usize) -> Option<String> {
    let value = translations.get(index.to_string())?;

    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// 将字面量 `\n`（两个字符）还原为换行
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completion(content: &str) -> Value {
        json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": content}}
            ]
        })
    }

    #[test]
    fn test_roundtrip_indexing() {
        let raw = completion(r#"{"0":"甲","1":"乙"}"#);
        let translations = parse_translations(&raw, 2).unwrap();
        assert_eq!(
            translations,
            vec![Some("甲".to_string()), Some("乙".to_string())]
        );
    }

    #[test]
    fn test_json_embedded_in_prose() {
        let raw = completion("好的，以下是翻譯：\n```json\n{\"0\": \"你好\"}\n```\n完成。");
        let translations = parse_translations(&raw, 1).unwrap();
        assert_eq!(translations, vec![Some("你好".to_string())]);
    }

    #[test]
    fn test_missing_index_is_left_untranslated() {
        let raw = completion(r#"{"0":"甲"}"#);
        let translations = parse_translations(&raw, 2).unwrap();
        assert_eq!(translations, vec![Some("甲".to_string()), None]);
    }

    #[test]
    fn test_empty_and_null_values_are_untranslated() {
        let raw = completion(r#"{"0":"","1":null,"2":{"x":1},"3":42}"#);
        let translations = parse_translations(&raw, 4).unwrap();
        assert_eq!(translations, vec![None, None, None, Some("42".to_string())]);
    }

    #[test]
    fn test_unrelated_keys_are_ignored() {
        let raw = completion(r#"{"note": "done", "1": "乙"}"#);
        let translations = parse_translations(&raw, 2).unwrap();
        assert_eq!(translations, vec![None, Some("乙".to_string())]);
    }

    #[test]
    fn test_no_braces_is_malformed() {
        let raw = completion("抱歉，我無法翻譯。");
        let error = parse_translations(&raw, 1).unwrap_err();
        assert!(matches!(error, TranslationError::MalformedTranslation { .. }));
    }

    #[test]
    fn test_reversed_braces_is_malformed() {
        let raw = completion("} oops {");
        let error = parse_translations(&raw, 1).unwrap_err();
        assert!(matches!(error, TranslationError::MalformedTranslation { .. }));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let raw = completion(r#"{"0": "甲",}"#);
        let error = parse_translations(&raw, 1).unwrap_err();
        assert!(matches!(error, TranslationError::MalformedTranslation { .. }));
    }

    #[test]
    fn test_missing_content_is_empty_completion() {
        for raw in [
            json!({}),
            json!({"choices": []}),
            json!({"choices": [{"message": {"role": "assistant"}}]}),
            json!({"choices": [{"message": {"content": null}}]}),
            completion(""),
        ] {
            assert_eq!(
                parse_translations(&raw, 1).unwrap_err(),
                TranslationError::EmptyCompletion
            );
        }
    }

    #[test]
    fn test_unescape_newlines() {
        assert_eq!(unescape_newlines("第一行\\n第二行"), "第一行\n第二行");
        assert_eq!(unescape_newlines("no escapes"), "no escapes");
    }
}
