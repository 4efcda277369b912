//! 用户通知服务 - 业务能力层
//!
//! 对应产品里的 toast 通知：所有错误都是瞬态的用户可见提示，
//! 不落盘、不致命。默认走 tracing 输出；可以外接一个通道，
//! 由界面层（或测试）消费通知事件。

use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

/// 通知级别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// 操作成功
    Success(String),
    /// 警告（如本地拒绝、翻译降级）
    Warning(String),
    /// 错误（瞬态，用户可重试）
    Error(String),
}

impl Notice {
    /// 通知正文
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(t) | Notice::Warning(t) | Notice::Error(t) => t,
        }
    }
}

/// 用户通知服务
///
/// 职责：
/// - 只负责"发出一条通知"能力
/// - 不关心通知产生的流程
#[derive(Clone, Default)]
pub struct Notifier {
    sink: Option<UnboundedSender<Notice>>,
}

impl Notifier {
    /// 创建新的通知服务（仅 tracing 输出）
    pub fn new() -> Self {
        Self { sink: None }
    }

    /// 创建带事件通道的通知服务
    pub fn with_sink(sink: UnboundedSender<Notice>) -> Self {
        Self { sink: Some(sink) }
    }

    /// 发出成功通知
    pub fn success(&self, text: impl Into<String>) {
        let text = text.into();
        info!("✅ {}", text);
        self.forward(Notice::Success(text));
    }

    /// 发出警告通知
    pub fn warning(&self, text: impl Into<String>) {
        let text = text.into();
        warn!("⚠️ {}", text);
        self.forward(Notice::Warning(text));
    }

    /// 发出错误通知
    pub fn error(&self, text: impl Into<String>) {
        let text = text.into();
        error!("❌ {}", text);
        self.forward(Notice::Error(text));
    }

    fn forward(&self, notice: Notice) {
        if let Some(sink) = &self.sink {
            // 接收端关闭时静默丢弃，通知本来就是瞬态的
            let _ = sink.send(notice);
        }
    }
}
