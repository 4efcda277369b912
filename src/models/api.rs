//! 后端 API 的请求/响应数据结构

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// FAISS 初始化请求
#[derive(Debug, Clone, Serialize)]
pub struct InitializeRequest {
    pub urls: Vec<String>,
}

/// 任务创建响应（/initialize_faiss 与 /upload_pdfs/ 共用）
#[derive(Debug, Clone, Deserialize)]
pub struct TaskCreated {
    pub task_id: String,
}

/// 任务状态响应
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusResponse {
    pub status: String,
}

/// 提问请求
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    pub question: String,
}

/// URL 语料库的回答响应
#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// PDF 语料库的回答响应
#[derive(Debug, Clone, Deserialize)]
pub struct AskPdfResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Option<String>,
}

/// 后端错误响应体
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorDetail {
    /// 错误详情的展示文本
    pub fn detail_text(&self) -> String {
        match &self.detail {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "<无详情>".to_string(),
        }
    }
}

/// /ask_pdf 的提问结果
///
/// 409 冲突（语料库尚未就绪）不是硬错误，而是一个需要自动恢复的分支，
/// 所以单独建模而不是塞进错误类型里。
#[derive(Debug, Clone)]
pub enum AskPdfOutcome {
    /// 正常回答
    Answered {
        answer: String,
        sources: Option<String>,
    },
    /// 语料库尚未就绪（HTTP 409），携带从冲突详情中提取的任务ID
    NotReady { task_id: Option<String> },
}

/// 从 409 冲突详情中提取任务ID
///
/// 优先读取结构化字段 `{"task_id": "..."}`；退化为从自由文本中
/// 正则匹配 `task id: xxx` 一类的片段。
pub fn extract_conflict_task_id(detail: &Value) -> Option<String> {
    // 结构化字段优先
    if let Some(id) = detail.get("task_id").and_then(|v| v.as_str()) {
        if !id.trim().is_empty() {
            return Some(id.trim().to_string());
        }
    }

    // 自由文本兜底
    let text = match detail {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    static TASK_ID_RE: OnceLock<Regex> = OnceLock::new();
    let re = TASK_ID_RE.get_or_init(|| {
        Regex::new(r"(?i)task[_\s-]?id\W*([A-Za-z0-9][A-Za-z0-9_-]*)").expect("正则表达式无效")
    });
    re.captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_task_id_structured() {
        let detail = json!({"task_id": "abc-123"});
        assert_eq!(
            extract_conflict_task_id(&detail),
            Some("abc-123".to_string())
        );
    }

    #[test]
    fn test_extract_task_id_from_free_text() {
        let detail = json!("FAISS index is still being built, task id: 9f8e7d6c");
        assert_eq!(
            extract_conflict_task_id(&detail),
            Some("9f8e7d6c".to_string())
        );

        let detail = json!("Corpus not ready (task_id=abc-123), retry later");
        assert_eq!(
            extract_conflict_task_id(&detail),
            Some("abc-123".to_string())
        );
    }

    #[test]
    fn test_extract_task_id_missing() {
        let detail = json!("Corpus not ready, please retry");
        assert_eq!(extract_conflict_task_id(&detail), None);

        let detail = json!({"message": "not ready"});
        assert_eq!(extract_conflict_task_id(&detail), None);
    }

    #[test]
    fn test_structured_field_wins_over_text() {
        let detail = json!({
            "task_id": "structured-id",
            "message": "still building, task id: other-id"
        });
        assert_eq!(
            extract_conflict_task_id(&detail),
            Some("structured-id".to_string())
        );
    }

    #[test]
    fn test_error_detail_text() {
        let detail: ErrorDetail =
            serde_json::from_value(json!({"detail": "invalid url"})).unwrap();
        assert_eq!(detail.detail_text(), "invalid url");

        let detail: ErrorDetail = serde_json::from_value(json!({})).unwrap();
        assert_eq!(detail.detail_text(), "<无详情>");
    }
}
