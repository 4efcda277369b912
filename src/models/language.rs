//! 语言代码映射
//!
//! 逻辑语言标签（界面语言）到翻译服务代码和语音合成 locale 的映射表。
//! 未登记的标签原样透传。

/// 翻译流水线的源语言（后端回答固定为英文）
pub const SOURCE_LANGUAGE: &str = "en";

/// 界面支持的语言列表（标签, 显示名）
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
];

/// 逻辑语言标签 → 翻译服务代码
static TRANSLATE_CODES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "en" => "en",
    "hi" => "hi",
    "es" => "es",
    "fr" => "fr",
    "de" => "de",
    "zh" => "zh",
    "pt" => "pt",
};

/// 逻辑语言标签 → 语音合成 locale
static SPEECH_LOCALES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "en" => "en-US",
    "hi" => "hi-IN",
    "es" => "es-ES",
    "fr" => "fr-FR",
    "de" => "de-DE",
};

/// 语音合成的默认 locale
pub const DEFAULT_SPEECH_LOCALE: &str = "en-US";

/// 查询翻译服务代码，未登记的标签原样透传
pub fn translate_code(tag: &str) -> &str {
    TRANSLATE_CODES.get(tag).copied().unwrap_or(tag)
}

/// 查询语音合成 locale，未登记的标签回落到美式英语
pub fn speech_locale(tag: &str) -> &'static str {
    SPEECH_LOCALES
        .get(tag)
        .copied()
        .unwrap_or(DEFAULT_SPEECH_LOCALE)
}

/// 标签是否在界面支持列表中
pub fn is_supported(tag: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(t, _)| *t == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_code_mapped() {
        assert_eq!(translate_code("hi"), "hi");
        assert_eq!(translate_code("de"), "de");
    }

    #[test]
    fn test_translate_code_passthrough() {
        // 未登记的标签原样透传
        assert_eq!(translate_code("ja"), "ja");
        assert_eq!(translate_code("xx-unknown"), "xx-unknown");
    }

    #[test]
    fn test_speech_locale() {
        assert_eq!(speech_locale("hi"), "hi-IN");
        assert_eq!(speech_locale("fr"), "fr-FR");
        assert_eq!(speech_locale("ja"), DEFAULT_SPEECH_LOCALE);
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported("en"));
        assert!(is_supported("hi"));
        assert!(!is_supported("ja"));
    }
}
