//! 提问上下文封装

/// 提问针对的语料库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusKind {
    /// URL 语料库（/ask）
    Url,
    /// PDF 语料库（/ask_pdf，需要令牌）
    Pdf,
}

/// 一次提问的上下文
#[derive(Debug, Clone)]
pub struct AskCtx {
    /// 问题内容
    pub question: String,
    /// 目标语言标签（回答翻译用）
    pub language: String,
    /// 语料库类型
    pub corpus: CorpusKind,
}

impl AskCtx {
    pub fn new(question: impl Into<String>, language: impl Into<String>, corpus: CorpusKind) -> Self {
        Self {
            question: question.into(),
            language: language.into(),
            corpus,
        }
    }
}
