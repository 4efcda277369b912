//! 任务状态轮询器 - 业务能力层
//!
//! 给定任务ID，按固定间隔查询状态端点，直到观察到终止状态。
//! 每个关注点（URL 摄取 / PDF 摄取）同一时刻至多一个活动定时器：
//! 重新启动必须先取消旧定时器，组件销毁时定时器随之中止。

use crate::error::AppResult;
use crate::models::TaskStatus;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 轮询关注点
///
/// URL 摄取与 PDF 摄取各自持有独立的轮询器，互不干扰。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concern {
    UrlIngestion,
    PdfIngestion,
}

impl fmt::Display for Concern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concern::UrlIngestion => write!(f, "URL"),
            Concern::PdfIngestion => write!(f, "PDF"),
        }
    }
}

/// 单次轮询产生的状态更新
#[derive(Debug, Clone, PartialEq)]
pub enum PollUpdate {
    /// 非终止状态，携带进度文本
    Progress(TaskStatus),
    /// 任务完成（终止，恰好上报一次）
    Completed,
    /// 任务失败（终止，恰好上报一次）
    Failed(Option<String>),
    /// 轮询本身出错（网络/解析），视为软失败并停止轮询
    Error(String),
}

/// 轮询事件
#[derive(Debug, Clone, PartialEq)]
pub struct PollEvent {
    pub concern: Concern,
    pub task_id: String,
    pub update: PollUpdate,
}

/// 任务状态轮询器
///
/// 职责：
/// - 持有一个关注点的活动定时器句柄
/// - 重新启动先取消旧定时器（同一关注点至多一个活动轮询）
/// - 终止状态 / 轮询错误 / 句柄销毁时停止
pub struct TaskPoller {
    concern: Concern,
    handle: Option<JoinHandle<()>>,
}

impl TaskPoller {
    /// 创建新的轮询器
    pub fn new(concern: Concern) -> Self {
        Self {
            concern,
            handle: None,
        }
    }

    /// 启动轮询
    ///
    /// # 参数
    /// - `task_id`: 后端签发的任务ID
    /// - `interval`: 轮询间隔
    /// - `events`: 状态更新的投递通道
    /// - `fetch_status`: 查询一次原始状态字符串的能力
    pub fn start<F, Fut>(
        &mut self,
        task_id: String,
        interval: Duration,
        events: UnboundedSender<PollEvent>,
        fetch_status: F,
    ) where
        F: Fn(String) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<String>> + Send + 'static,
    {
        // 同一关注点先取消旧定时器，避免两个轮询竞争写同一份状态
        self.stop();

        let concern = self.concern;
        info!("[{}] 🔄 开始轮询任务 {}", concern, task_id);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // interval 的首个 tick 立即完成，先消费掉，保证首查发生在一个间隔之后
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let update = match fetch_status(task_id.clone()).await {
                    Ok(raw) => {
                        let status = TaskStatus::parse(&raw);
                        debug!("[{}] 任务 {} 状态: {}", concern, task_id, status);
                        match status {
                            TaskStatus::Completed => PollUpdate::Completed,
                            TaskStatus::Failed(reason) => PollUpdate::Failed(reason),
                            other => PollUpdate::Progress(other),
                        }
                    }
                    Err(e) => {
                        warn!("[{}] 轮询任务 {} 出错: {}", concern, task_id, e);
                        PollUpdate::Error(e.to_string())
                    }
                };

                let terminal = !matches!(update, PollUpdate::Progress(_));
                let sent = events
                    .send(PollEvent {
                        concern,
                        task_id: task_id.clone(),
                        update,
                    })
                    .is_ok();

                // 终止状态恰好上报一次后停止；接收端关闭也停止
                if terminal || !sent {
                    break;
                }
            }
        });

        self.handle = Some(handle);
    }

    /// 停止轮询（取消活动定时器）
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("[{}] 轮询已取消", self.concern);
        }
    }

    /// 是否存在活动定时器
    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for TaskPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    const TICK: Duration = Duration::from_millis(1);

    /// 按脚本逐次返回状态的查询桩；脚本耗尽后停在最后一个状态
    fn scripted_fetch(
        statuses: &[&str],
    ) -> impl Fn(String) -> futures::future::Ready<AppResult<String>> + Send + 'static {
        let script: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(
            statuses.iter().map(|s| s.to_string()).collect(),
        ));
        move |_task_id| {
            let mut script = script.lock().unwrap();
            let status = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap_or_default()
            };
            futures::future::ready(Ok(status))
        }
    }

    #[tokio::test]
    async fn test_poller_stops_on_completed_and_reports_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = TaskPoller::new(Concern::UrlIngestion);
        poller.start(
            "task-1".to_string(),
            TICK,
            tx,
            scripted_fetch(&["Initializing", "Processing", "Completed"]),
        );

        let mut updates = Vec::new();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.task_id, "task-1");
            updates.push(event.update);
        }

        // 两次进度 + 恰好一次完成，然后通道关闭（轮询任务结束）
        assert_eq!(updates.len(), 3);
        assert!(matches!(updates[0], PollUpdate::Progress(_)));
        assert!(matches!(updates[1], PollUpdate::Progress(_)));
        assert_eq!(updates[2], PollUpdate::Completed);
    }

    #[tokio::test]
    async fn test_poller_stops_immediately_on_failed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = TaskPoller::new(Concern::PdfIngestion);
        poller.start(
            "task-2".to_string(),
            TICK,
            tx,
            scripted_fetch(&["Failed: bad file"]),
        );

        let mut updates = Vec::new();
        while let Some(event) = rx.recv().await {
            updates.push(event.update);
        }

        // 恰好一次失败上报，从未上报成功
        assert_eq!(
            updates,
            vec![PollUpdate::Failed(Some("bad file".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_poll_error_stops_loop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = TaskPoller::new(Concern::UrlIngestion);
        poller.start("task-3".to_string(), TICK, tx, |_id| async {
            Err(AppError::Other("connection refused".to_string()))
        });

        let mut updates = Vec::new();
        while let Some(event) = rx.recv().await {
            updates.push(event.update);
        }

        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], PollUpdate::Error(_)));
    }

    #[tokio::test]
    async fn test_restart_cancels_previous_poller() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = TaskPoller::new(Concern::UrlIngestion);

        // 第一个任务永远停在 Processing
        poller.start(
            "old-task".to_string(),
            TICK,
            tx.clone(),
            scripted_fetch(&["Processing"]),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;

        // 重新启动：旧定时器必须被取消
        poller.start(
            "new-task".to_string(),
            TICK,
            tx.clone(),
            scripted_fetch(&["Completed"]),
        );
        drop(tx);

        // 等到新任务完成
        let mut saw_new_completed = false;
        while let Some(event) = rx.recv().await {
            if event.task_id == "new-task" && event.update == PollUpdate::Completed {
                saw_new_completed = true;
                // 完成之后不应再有任何事件（旧轮询已被取消）
                tokio::time::sleep(Duration::from_millis(20)).await;
                assert!(rx.try_recv().is_err());
                break;
            }
        }
        assert!(saw_new_completed);
    }

    #[tokio::test]
    async fn test_stop_clears_active_timer() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut poller = TaskPoller::new(Concern::PdfIngestion);
        poller.start(
            "task-4".to_string(),
            Duration::from_secs(3600),
            tx,
            scripted_fetch(&["Processing"]),
        );
        assert!(poller.is_active());

        poller.stop();
        assert!(!poller.is_active());
    }
}
