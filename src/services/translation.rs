//! 分块翻译流水线 - 业务能力层
//!
//! 翻译服务对单次请求有长度限制，这里把任意长度的文本切成
//! 不超过上限的分块逐个翻译再拼回：
//! 1. 文本不超过上限 → 整体一个分块
//! 2. 否则按句子边界（`.` `!` `?` 后跟空白）累积切分
//! 3. 仍超限的分块再按词边界二次切分
//!
//! 任何一个分块翻译失败，整个操作放弃并返回原文（软降级），
//! 同时发出一条"翻译不可用"的用户通知。

use crate::clients::{ChunkTranslator, TranslateClient};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::language;
use crate::services::notifier::Notifier;
use tracing::{debug, warn};

/// 分块翻译流水线
pub struct TranslationService {
    translator: Box<dyn ChunkTranslator>,
    notifier: Notifier,
    max_chunk_len: usize,
}

impl TranslationService {
    /// 创建新的翻译流水线
    pub fn new(config: &Config, notifier: Notifier) -> AppResult<Self> {
        Ok(Self {
            translator: Box::new(TranslateClient::new(config)?),
            notifier,
            max_chunk_len: config.max_chunk_len,
        })
    }

    /// 使用自定义分块翻译器创建（测试用）
    pub fn with_translator(
        translator: Box<dyn ChunkTranslator>,
        max_chunk_len: usize,
        notifier: Notifier,
    ) -> Self {
        Self {
            translator,
            notifier,
            max_chunk_len,
        }
    }

    /// 把文本翻译为目标语言
    ///
    /// # 参数
    /// - `text`: 待翻译文本（源语言固定为英文）
    /// - `target`: 目标语言标签
    ///
    /// # 返回
    /// 返回翻译结果；目标语言即源语言或文本为空时原样返回（不发请求），
    /// 任何分块失败时返回原文并发出降级通知。
    pub async fn translate(&self, text: &str, target: &str) -> String {
        // 快速路径：空文本或目标语言即源语言，零网络调用
        if text.trim().is_empty() || target == language::SOURCE_LANGUAGE {
            return text.to_string();
        }

        let source_code = language::translate_code(language::SOURCE_LANGUAGE);
        let target_code = language::translate_code(target);

        let chunks = split_into_chunks(text, self.max_chunk_len);
        debug!("翻译 {} 个分块: en → {}", chunks.len(), target_code);

        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            match self
                .translator
                .translate_chunk(chunk, source_code, target_code)
                .await
            {
                Ok(piece) if !piece.trim().is_empty() => {
                    translated.push(piece.trim().to_string());
                }
                Ok(_) => {
                    warn!("翻译分块返回空内容，放弃整体翻译");
                    self.notify_unavailable();
                    return text.to_string();
                }
                Err(e) => {
                    warn!("翻译分块失败: {}，放弃整体翻译", e);
                    self.notify_unavailable();
                    return text.to_string();
                }
            }
        }

        translated.join(" ")
    }

    fn notify_unavailable(&self) {
        self.notifier
            .warning("Translation unavailable, showing the original answer.");
    }
}

// ========== 分块算法 ==========

/// 把文本切成不超过 `max_len` 字符的分块
///
/// 不超限的文本整体作为唯一分块（去掉首尾空白）；超限的文本先按
/// 句子边界累积，仍超限的分块再按词边界二次切分。空分块被丢弃。
pub fn split_into_chunks(text: &str, max_len: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        let sentence_len = sentence.chars().count();
        let current_len = current.chars().count();

        if current_len == 0 {
            current.push_str(sentence);
        } else if current_len + 1 + sentence_len <= max_len {
            current.push(' ');
            current.push_str(sentence);
        } else {
            push_chunk(&mut chunks, std::mem::take(&mut current), max_len);
            current.push_str(sentence);
        }
    }
    push_chunk(&mut chunks, current, max_len);

    chunks
}

/// 按句子边界切分：`.` `!` `?` 后跟空白（或文本结尾）
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = match chars.peek() {
                Some((_, next)) => next.is_whitespace(),
                None => true,
            };
            if at_boundary {
                let end = i + c.len_utf8();
                sentences.push(&text[start..end]);
                start = end;
            }
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

/// 收纳一个分块；仍超限时按词边界二次切分
fn push_chunk(chunks: &mut Vec<String>, chunk: String, max_len: usize) {
    let chunk = chunk.trim();
    if chunk.is_empty() {
        return;
    }
    if chunk.chars().count() <= max_len {
        chunks.push(chunk.to_string());
        return;
    }

    let mut current = String::new();
    for word in chunk.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();

        if current_len == 0 {
            current.push_str(word);
        } else if current_len + 1 + word_len <= max_len {
            current.push(' ');
            current.push_str(word);
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, TranslateError};
    use crate::services::notifier::Notice;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    const MAX: usize = 450;

    /// 按脚本响应的桩翻译器
    struct ScriptedTranslator {
        /// 第 N 次调用失败（从 0 计）
        fail_on: Option<usize>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedTranslator {
        fn ok() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    fail_on: None,
                    calls: calls.clone(),
                },
                calls,
            )
        }

        fn failing_on(n: usize) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    fail_on: Some(n),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl ChunkTranslator for ScriptedTranslator {
        fn translate_chunk<'a>(
            &'a self,
            text: &'a str,
            _source: &'a str,
            target: &'a str,
        ) -> BoxFuture<'a, AppResult<String>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail_on == Some(n);
            Box::pin(async move {
                if fail {
                    Err(AppError::Translate(TranslateError::EmptyTranslation {
                        target_lang: target.to_string(),
                    }))
                } else {
                    Ok(format!("<{}>{}", target, text))
                }
            })
        }
    }

    fn long_text() -> String {
        // 远超 450 字符的多句文本
        let mut text = String::new();
        for i in 0..30 {
            text.push_str(&format!(
                "Sentence number {} talks about vector databases and retrieval. ",
                i
            ));
        }
        text
    }

    // ========== 分块算法 ==========

    #[test]
    fn test_short_text_single_chunk() {
        let text = "  What is FAISS?  ";
        let chunks = split_into_chunks(text, MAX);
        assert_eq!(chunks, vec!["What is FAISS?".to_string()]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(split_into_chunks("   ", MAX).is_empty());
        assert!(split_into_chunks("", MAX).is_empty());
    }

    #[test]
    fn test_long_text_chunks_within_bound() {
        let text = long_text();
        let chunks = split_into_chunks(&text, MAX);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.chars().count() <= MAX,
                "分块超限: {} 字符",
                chunk.chars().count()
            );
            assert!(!chunk.trim().is_empty());
        }
    }

    #[test]
    fn test_long_text_rejoins_to_original() {
        let text = long_text();
        let chunks = split_into_chunks(&text, MAX);
        // 用单空格拼回后，内容与原文在空白归一化意义下一致
        let rejoined = chunks.join(" ");
        let normalized_original: Vec<&str> = text.split_whitespace().collect();
        let normalized_rejoined: Vec<&str> = rejoined.split_whitespace().collect();
        assert_eq!(normalized_original, normalized_rejoined);
    }

    #[test]
    fn test_oversized_sentence_split_on_words() {
        // 一整句没有句号，只能按词切
        let words: Vec<String> = (0..200).map(|i| format!("word{}", i)).collect();
        let text = words.join(" ");
        let chunks = split_into_chunks(&text, 50);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50);
        }
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_sentence_boundary_requires_whitespace() {
        // "3.5" 中的点不是句子边界
        let sentences = split_sentences("Version 3.5 is out. It is fast!");
        assert_eq!(sentences, vec!["Version 3.5 is out.", " It is fast!"]);
    }

    // ========== 翻译流水线 ==========

    #[tokio::test]
    async fn test_identity_when_target_is_source() {
        let (stub, calls) = ScriptedTranslator::ok();
        let service =
            TranslationService::with_translator(Box::new(stub), MAX, Notifier::new());

        let result = service.translate("The answer is 42.", "en").await;
        assert_eq!(result, "The answer is 42.");
        // 恒等路径不发任何网络请求
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_text_is_identity() {
        let (stub, calls) = ScriptedTranslator::ok();
        let service =
            TranslationService::with_translator(Box::new(stub), MAX, Notifier::new());

        let result = service.translate("   ", "hi").await;
        assert_eq!(result, "   ");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chunks_translated_in_order_and_joined() {
        let (stub, calls) = ScriptedTranslator::ok();
        let service = TranslationService::with_translator(Box::new(stub), 50, Notifier::new());

        let text = "First sentence here. Second sentence follows. Third one ends the text.";
        let result = service.translate(text, "hi").await;

        assert!(calls.load(Ordering::SeqCst) > 1);
        // 每个分块都被标记翻译，且按原顺序用单空格拼接
        assert!(result.starts_with("<hi>First"));
        let first = result.find("First").unwrap();
        let second = result.find("Second").unwrap();
        let third = result.find("Third").unwrap();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn test_chunk_failure_returns_original_with_notice() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (stub, _calls) = ScriptedTranslator::failing_on(1);
        let service =
            TranslationService::with_translator(Box::new(stub), 50, Notifier::with_sink(tx));

        let text = "First sentence here. Second sentence follows. Third one ends the text.";
        let result = service.translate(text, "es").await;

        // 整体放弃，返回原文
        assert_eq!(result, text);
        // 恰好一条降级通知
        assert!(matches!(rx.try_recv().unwrap(), Notice::Warning(_)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_single_chunk_failure_returns_original() {
        let (stub, calls) = ScriptedTranslator::failing_on(0);
        let service =
            TranslationService::with_translator(Box::new(stub), MAX, Notifier::new());

        let result = service.translate("Short answer.", "fr").await;
        assert_eq!(result, "Short answer.");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
