use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

use super::models::{BatchResult, DownloadTask, TaskStatus};

/// 接收每个任务的完成事件
///
/// 多个下载任务会并发调用 `on_task_finished`，调用顺序就是完成顺序，
/// 和提交顺序无关，实现方需要自己保证计数更新是同步的。
pub trait ProgressSink: Send + Sync {
    fn on_batch_start(&self, _total: usize) {}

    fn on_task_finished(&self, task: &DownloadTask);

    fn on_batch_finish(&self, _result: &BatchResult) {}
}

/// 什么都不做
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_task_finished(&self, _task: &DownloadTask) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl ProgressSnapshot {
    pub fn finished(&self) -> usize {
        self.succeeded + self.failed
    }
}

// 原子计数
#[derive(Debug, Default)]
pub struct CountingProgress {
    total: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次完成，返回记录之后的快照
    pub fn record(&self, status: &TaskStatus) -> ProgressSnapshot {
        match status {
            TaskStatus::Completed => {
                self.succeeded.fetch_add(1, Ordering::SeqCst);
            }
            _ => {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

impl ProgressSink for CountingProgress {
    fn on_batch_start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn on_task_finished(&self, task: &DownloadTask) {
        self.record(&task.status);
    }
}

/// 终端进度条，消息格式: 已完成/总数 (失败: n)
pub struct BarProgress {
    bar: ProgressBar,
    counter: CountingProgress,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);

        Self {
            bar,
            counter: CountingProgress::new(),
        }
    }

    fn message(snapshot: &ProgressSnapshot) -> String {
        format!(
            "{}/{} (失败: {})",
            snapshot.finished(),
            snapshot.total,
            snapshot.failed
        )
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn on_batch_start(&self, total: usize) {
        self.counter.on_batch_start(total);
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_message(Self::message(&self.counter.snapshot()));
    }

    fn on_task_finished(&self, task: &DownloadTask) {
        let snapshot = self.counter.record(&task.status);
        if let TaskStatus::Failed(reason) = &task.status {
            self.bar
                .println(format!("下载失败: {} ({})", task.url, reason));
        }
        self.bar.inc(1);
        self.bar.set_message(Self::message(&snapshot));
    }

    fn on_batch_finish(&self, _result: &BatchResult) {
        self.bar
            .finish_with_message(Self::message(&self.counter.snapshot()));
    }
}
