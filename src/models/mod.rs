//! 数据模型层

pub mod api;
pub mod language;
pub mod manifest;
pub mod task;

pub use api::{
    extract_conflict_task_id, AskPdfOutcome, AskPdfResponse, AskRequest, AskResponse, ErrorDetail,
    InitializeRequest, TaskCreated, TaskStatusResponse,
};
pub use manifest::CorpusManifest;
pub use task::TaskStatus;
