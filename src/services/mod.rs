//! 业务能力层
//!
//! 描述"我能做什么"，不编排流程：
//! - `TaskPoller` - 任务状态轮询能力
//! - `TranslationService` - 分块翻译能力
//! - `SpeechService` - 语音合成/识别编排能力
//! - `Notifier` - 用户通知能力

pub mod notifier;
pub mod speech;
pub mod task_poller;
pub mod translation;

pub use notifier::{Notice, Notifier};
pub use speech::{LogSynthesizer, SpeechRecognizer, SpeechService, SpeechSynthesizer, UnsupportedRecognizer};
pub use task_poller::{Concern, PollEvent, PollUpdate, TaskPoller};
pub use translation::TranslationService;
