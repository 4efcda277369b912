//! # VectraMind
//!
//! 向量知识库问答客户端：摄取网页/PDF 语料，轮询索引构建任务，
//! 提问并把回答翻译、朗读出来。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 持有 HTTP 连接，只暴露能力
//! - `BackendClient` - QA 后端能力（摄取 / 状态 / 提问）
//! - `TranslateClient` - 单分块翻译能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心界面流程
//! - `TranslationService` - 分块翻译流水线（软降级）
//! - `TaskPoller` - 任务状态轮询（每个关注点至多一个定时器）
//! - `SpeechService` - 语音合成/识别编排
//! - `Notifier` - 用户通知（toast 语义）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次提问"的完整处理流程
//! - `AskCtx` - 上下文封装（question + language + corpus）
//! - `AskFlow` - 流程编排（校验 → 提交 → 409 恢复 → 翻译 → 通知）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 交互会话，持有组件局部状态与轮询器
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{BackendClient, ChunkTranslator, QaBackend, TranslateClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AskPdfOutcome, CorpusManifest, TaskStatus};
pub use orchestrator::App;
pub use services::{Notifier, SpeechService, TaskPoller, TranslationService};
pub use workflow::{AskCtx, AskFlow, AskOutcome, CorpusKind};
