//! 任务状态模型
//!
//! 后端的任务状态是自由文本字符串，这里把它归一化为枚举：
//! - `Completed` / `Failed` / `Failed:<原因>` 为终止状态
//! - `Initializing` 与其他任意进度文本为非终止状态

use std::fmt;

/// 后端任务状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// 初始化中
    Initializing,
    /// 处理中（携带后端原始进度文本）
    Processing(String),
    /// 处理完成
    Completed,
    /// 处理失败（可能携带原因）
    Failed(Option<String>),
}

impl TaskStatus {
    /// 解析后端返回的原始状态字符串
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == "Completed" {
            return TaskStatus::Completed;
        }
        if trimmed == "Failed" {
            return TaskStatus::Failed(None);
        }
        if let Some(reason) = trimmed.strip_prefix("Failed:") {
            let reason = reason.trim();
            if reason.is_empty() {
                return TaskStatus::Failed(None);
            }
            return TaskStatus::Failed(Some(reason.to_string()));
        }
        if trimmed == "Initializing" || trimmed == "Initializing..." {
            return TaskStatus::Initializing;
        }
        TaskStatus::Processing(trimmed.to_string())
    }

    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed(_))
    }

    /// 是否为失败状态
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }

    /// 显示给用户的进度文本
    pub fn progress_text(&self) -> String {
        match self {
            TaskStatus::Initializing => "Initializing...".to_string(),
            TaskStatus::Processing(raw) => raw.clone(),
            TaskStatus::Completed => "Completed".to_string(),
            TaskStatus::Failed(None) => "Failed".to_string(),
            TaskStatus::Failed(Some(reason)) => format!("Failed: {}", reason),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.progress_text())
    }
}
