//! 语音输入/输出 - 业务能力层
//!
//! 语音合成与识别是宿主能力（浏览器里是 Web Speech API），这里只
//! 定义引擎 trait 与编排逻辑：
//! - 合成：把回答按 `.` `!` `?` `,` 切成近似句子的片段，顺序朗读，
//!   上一段完成才开始下一段；语言标签映射到 locale，未命中或无对应
//!   语音时回落到美式英语
//! - 识别：单次、非中间态的听写，原始转写经翻译流水线（目标固定
//!   英文）后写入问题槽

use crate::error::{AppError, AppResult, SpeechError};
use crate::models::language;
use crate::services::translation::TranslationService;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

/// 语音合成引擎
pub trait SpeechSynthesizer: Send {
    /// 朗读一个片段，阻塞直到本次发声完成
    fn speak(&mut self, text: &str, locale: &str) -> AppResult<()>;

    /// 引擎是否安装了指定 locale 的语音
    fn has_voice(&self, locale: &str) -> bool {
        let _ = locale;
        true
    }
}

/// 语音识别引擎
pub trait SpeechRecognizer: Send {
    /// 单次听写，返回一次性（非中间态）的识别文本
    fn recognize_once(&mut self, language_tag: &str) -> AppResult<String>;
}

/// 语音编排服务
pub struct SpeechService;

impl SpeechService {
    pub fn new() -> Self {
        Self
    }

    /// 顺序朗读一段文本
    ///
    /// # 参数
    /// - `engine`: 语音合成引擎
    /// - `text`: 待朗读文本
    /// - `language_tag`: 逻辑语言标签（映射到 locale）
    pub fn speak(
        &self,
        engine: &mut dyn SpeechSynthesizer,
        text: &str,
        language_tag: &str,
    ) -> AppResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let mut locale = language::speech_locale(language_tag);
        if !engine.has_voice(locale) {
            // 没有对应语音时回落到默认 locale
            locale = language::DEFAULT_SPEECH_LOCALE;
        }

        let segments = segment_utterances(text);
        debug!("朗读 {} 个片段, locale: {}", segments.len(), locale);

        for segment in &segments {
            engine.speak(segment, locale)?;
        }
        Ok(())
    }

    /// 单次听写并翻译为英文，得到可写入问题槽的文本
    pub async fn capture_question(
        &self,
        recognizer: &mut dyn SpeechRecognizer,
        translation: &TranslationService,
        language_tag: &str,
    ) -> AppResult<String> {
        let transcript = recognizer.recognize_once(language_tag)?;
        debug!("听写转写: {}", transcript);
        // 目标固定英文；源语言即英文时流水线走恒等快速路径
        Ok(translation
            .translate(&transcript, language::SOURCE_LANGUAGE)
            .await)
    }
}

impl Default for SpeechService {
    fn default() -> Self {
        Self::new()
    }
}

/// 把文本切成近似句子的朗读片段（按 `.` `!` `?` `,` 切分）
pub fn segment_utterances(text: &str) -> Vec<String> {
    static SEGMENT_RE: OnceLock<Regex> = OnceLock::new();
    let re = SEGMENT_RE.get_or_init(|| Regex::new(r"[^.!?,]+[.!?,]*").expect("正则表达式无效"));

    let segments: Vec<String> = re
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() && !text.trim().is_empty() {
        return vec![text.trim().to_string()];
    }
    segments
}

// ========== 默认引擎 ==========

/// 日志语音引擎：把每个片段打印出来，立即"完成"
///
/// 终端环境没有真正的语音合成设备时的默认实现。
#[derive(Debug, Default)]
pub struct LogSynthesizer;

impl SpeechSynthesizer for LogSynthesizer {
    fn speak(&mut self, text: &str, locale: &str) -> AppResult<()> {
        info!("🔊 [{}] {}", locale, text);
        Ok(())
    }
}

/// 不可用的识别引擎：终端环境默认不支持听写
#[derive(Debug, Default)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn recognize_once(&mut self, _language_tag: &str) -> AppResult<String> {
        Err(AppError::Speech(SpeechError::RecognitionUnsupported))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 记录每次发声的桩引擎
    #[derive(Default)]
    struct RecordingSynthesizer {
        utterances: Vec<(String, String)>,
        installed_voices: Option<Vec<String>>,
    }

    impl SpeechSynthesizer for RecordingSynthesizer {
        fn speak(&mut self, text: &str, locale: &str) -> AppResult<()> {
            self.utterances.push((text.to_string(), locale.to_string()));
            Ok(())
        }

        fn has_voice(&self, locale: &str) -> bool {
            match &self.installed_voices {
                Some(voices) => voices.iter().any(|v| v == locale),
                None => true,
            }
        }
    }

    #[test]
    fn test_segment_utterances_on_punctuation() {
        let segments = segment_utterances("Hello world. How are you, friend?");
        assert_eq!(
            segments,
            vec![
                "Hello world.".to_string(),
                "How are you,".to_string(),
                "friend?".to_string(),
            ]
        );
    }

    #[test]
    fn test_segment_utterances_without_punctuation() {
        let segments = segment_utterances("just one plain segment");
        assert_eq!(segments, vec!["just one plain segment".to_string()]);
    }

    #[test]
    fn test_speak_sequential_order_and_locale() {
        let service = SpeechService::new();
        let mut engine = RecordingSynthesizer::default();

        service
            .speak(&mut engine, "First part. Second part!", "hi")
            .unwrap();

        assert_eq!(
            engine.utterances,
            vec![
                ("First part.".to_string(), "hi-IN".to_string()),
                ("Second part!".to_string(), "hi-IN".to_string()),
            ]
        );
    }

    #[test]
    fn test_speak_falls_back_when_voice_missing() {
        let service = SpeechService::new();
        let mut engine = RecordingSynthesizer {
            installed_voices: Some(vec!["en-US".to_string()]),
            ..Default::default()
        };

        service.speak(&mut engine, "Bonjour le monde.", "fr").unwrap();

        // fr-FR 未安装，回落到 en-US
        assert_eq!(engine.utterances[0].1, "en-US");
    }

    #[test]
    fn test_speak_unknown_tag_defaults_to_en_us() {
        let service = SpeechService::new();
        let mut engine = RecordingSynthesizer::default();

        service.speak(&mut engine, "Hello.", "ja").unwrap();
        assert_eq!(engine.utterances[0].1, "en-US");
    }

    #[test]
    fn test_speak_empty_text_is_noop() {
        let service = SpeechService::new();
        let mut engine = RecordingSynthesizer::default();
        service.speak(&mut engine, "   ", "en").unwrap();
        assert!(engine.utterances.is_empty());
    }

    #[test]
    fn test_unsupported_recognizer_reports_capability_error() {
        let mut recognizer = UnsupportedRecognizer;
        let result = recognizer.recognize_once("en");
        assert!(matches!(
            result,
            Err(AppError::Speech(SpeechError::RecognitionUnsupported))
        ));
    }
}
