//! 流程层
//!
//! 定义"一次提问"的完整处理流程，只依赖客户端能力与业务能力。

pub mod ask_ctx;
pub mod ask_flow;

pub use ask_ctx::{AskCtx, CorpusKind};
pub use ask_flow::{AskFlow, AskOutcome};
