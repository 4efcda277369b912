//! 提问流程 - 流程层
//!
//! 核心职责：定义"一次提问"的完整处理流程
//!
//! 流程顺序：
//! 1. 本地校验（空问题 / 语料库处理中）
//! 2. 提交问题 → 翻译回答 → 通知
//! 3. PDF 语料库遇到 409 冲突时：有界重试循环 → 恰好一次自动重提

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::clients::QaBackend;
use crate::config::Config;
use crate::error::AppError;
use crate::models::{AskPdfOutcome, TaskStatus};
use crate::services::{Notifier, TranslationService};
use crate::workflow::ask_ctx::AskCtx;

/// 提问流程的结果
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    /// 拿到回答（已按目标语言翻译）
    Answered {
        answer: String,
        sources: Option<String>,
    },
    /// 本地拒绝（空问题或语料库处理中），没有发出网络请求
    Rejected,
    /// 请求失败（瞬态，用户可重试）
    RequestFailed(String),
    /// 摄取任务以失败告终
    IngestionFailed(Option<String>),
    /// 重试循环超出最大次数
    TimedOut,
}

/// 提问流程
///
/// - 编排一次提问的完整流程
/// - 不持有轮询定时器（409 重试是有界循环，不是长期轮询器）
/// - 只依赖后端能力（trait）与业务能力（services）
pub struct AskFlow<B: QaBackend> {
    backend: B,
    translation: Arc<TranslationService>,
    notifier: Notifier,
    poll_interval: Duration,
    max_polls: u32,
}

impl<B: QaBackend> AskFlow<B> {
    /// 创建新的提问流程
    pub fn new(
        backend: B,
        translation: Arc<TranslationService>,
        notifier: Notifier,
        config: &Config,
    ) -> Self {
        Self {
            backend,
            translation,
            notifier,
            poll_interval: config.poll_interval(),
            max_polls: config.max_polls,
        }
    }

    /// 向 URL 语料库提问
    pub async fn ask_url(&self, ctx: &AskCtx) -> Result<AskOutcome> {
        if ctx.question.trim().is_empty() {
            self.notifier.warning("Please enter a question.");
            return Ok(AskOutcome::Rejected);
        }

        info!("📤 提交问题到 URL 语料库...");
        let answer = match self.backend.ask(&ctx.question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("提问失败: {}", e);
                self.notifier.error("Error retrieving answer.");
                return Ok(AskOutcome::RequestFailed(e.to_string()));
            }
        };

        let translated = self.translation.translate(&answer, &ctx.language).await;
        self.notifier.success("Answer retrieved!");
        Ok(AskOutcome::Answered {
            answer: translated,
            sources: None,
        })
    }

    /// 向 PDF 语料库提问
    ///
    /// # 参数
    /// - `ctx`: 提问上下文
    /// - `locally_processing`: 本地已知语料库仍在处理中
    ///
    /// 本地已知处理中时直接拒绝（零网络请求）；后端返回 409 时进入
    /// 有界重试循环，摄取完成后恰好自动重提一次。
    pub async fn ask_pdf(&self, ctx: &AskCtx, locally_processing: bool) -> Result<AskOutcome> {
        if ctx.question.trim().is_empty() {
            self.notifier.warning("Please enter a question.");
            return Ok(AskOutcome::Rejected);
        }

        // 本地拒绝：不发任何网络请求，恰好一条警告
        if locally_processing {
            self.notifier
                .warning("Your documents are still processing. Please wait.");
            return Ok(AskOutcome::Rejected);
        }

        info!("📤 提交问题到 PDF 语料库...");
        match self.backend.ask_pdf(&ctx.question).await {
            Ok(AskPdfOutcome::Answered { answer, sources }) => {
                self.deliver_answer(ctx, answer, sources).await
            }
            Ok(AskPdfOutcome::NotReady { task_id }) => {
                self.recover_from_conflict(ctx, task_id).await
            }
            Err(e) => Ok(self.report_request_error(e)),
        }
    }

    // ========== 409 冲突恢复 ==========

    /// 语料库尚未就绪：轮询摄取任务，完成后自动重提一次
    async fn recover_from_conflict(
        &self,
        ctx: &AskCtx,
        task_id: Option<String>,
    ) -> Result<AskOutcome> {
        let task_id = match task_id {
            Some(id) => id,
            None => {
                // 没有任务ID就无从恢复，按瞬态错误处理
                warn!("409 冲突但无任务ID，无法自动恢复");
                self.notifier.error("Error retrieving answer.");
                return Ok(AskOutcome::RequestFailed(
                    "conflict response without task id".to_string(),
                ));
            }
        };

        info!(
            "⏳ 语料库尚未就绪，轮询任务 {} (间隔 {:?}, 最多 {} 次)...",
            task_id, self.poll_interval, self.max_polls
        );

        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let raw = match self.backend.task_status(&task_id).await {
                Ok(raw) => raw,
                Err(e) => return Ok(self.report_request_error(e)),
            };

            match TaskStatus::parse(&raw) {
                TaskStatus::Completed => {
                    info!("✓ 摄取完成 (第 {} 次轮询)，自动重提问题", attempt);
                    return self.resubmit_once(ctx).await;
                }
                TaskStatus::Failed(reason) => {
                    warn!("❌ 摄取任务失败: {:?}", reason);
                    self.notifier
                        .error("Document processing failed. Please upload again.");
                    return Ok(AskOutcome::IngestionFailed(reason));
                }
                status => {
                    info!("[重试 {}/{}] 状态: {}", attempt, self.max_polls, status);
                }
            }
        }

        warn!("⏰ 重试循环超出 {} 次，放弃", self.max_polls);
        self.notifier
            .error("Timed out waiting for document processing.");
        Ok(AskOutcome::TimedOut)
    }

    /// 恰好一次的自动重提，之后不再重试
    async fn resubmit_once(&self, ctx: &AskCtx) -> Result<AskOutcome> {
        match self.backend.ask_pdf(&ctx.question).await {
            Ok(AskPdfOutcome::Answered { answer, sources }) => {
                self.deliver_answer(ctx, answer, sources).await
            }
            Ok(AskPdfOutcome::NotReady { .. }) => {
                // 重提仍然冲突：不再继续自动重试
                warn!("重提后语料库仍未就绪，放弃");
                self.notifier.error("Error retrieving answer.");
                Ok(AskOutcome::RequestFailed(
                    "corpus still not ready after resubmission".to_string(),
                ))
            }
            Err(e) => Ok(self.report_request_error(e)),
        }
    }

    // ========== 辅助方法 ==========

    /// 翻译回答并发出成功通知
    async fn deliver_answer(
        &self,
        ctx: &AskCtx,
        answer: String,
        sources: Option<String>,
    ) -> Result<AskOutcome> {
        let translated = self.translation.translate(&answer, &ctx.language).await;
        self.notifier.success("Answer retrieved!");
        Ok(AskOutcome::Answered {
            answer: translated,
            sources,
        })
    }

    /// 把请求错误转成瞬态通知
    fn report_request_error(&self, e: AppError) -> AskOutcome {
        warn!("提问失败: {}", e);
        match e {
            AppError::Config(_) => {
                self.notifier
                    .error("Failed to retrieve authentication token.");
            }
            _ => {
                self.notifier.error("Error retrieving answer.");
            }
        }
        AskOutcome::RequestFailed(e.to_string())
    }
}
