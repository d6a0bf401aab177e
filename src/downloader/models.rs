use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub task_id: String,
    pub url: String,
    pub output_path: PathBuf, // 父目录必须已经存在，下载器不负责创建目录
    pub status: TaskStatus,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            task_id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
            output_path: output_path.into(),
            status: TaskStatus::Queued,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status != TaskStatus::Queued
    }
}

/// 按插入顺序排列的一批任务，完成顺序不保证
pub type DownloadBatch = Vec<DownloadTask>;

// --------------------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Completed,
    Failed(String), // 失败原因
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTask {
    pub url: String,
    pub output_path: PathBuf,
    pub reason: String,
}

/// 一批任务的汇总结果，tasks 保持提交时的顺序
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<FailedTask>,
    pub tasks: Vec<DownloadTask>,
}

impl BatchResult {
    pub fn from_tasks(tasks: Vec<DownloadTask>) -> Self {
        let mut result = BatchResult {
            attempted: tasks.len(),
            ..Default::default()
        };

        for task in &tasks {
            match &task.status {
                TaskStatus::Completed => result.succeeded += 1,
                TaskStatus::Failed(reason) => {
                    result.failed += 1;
                    result.failures.push(FailedTask {
                        url: task.url.clone(),
                        output_path: task.output_path.clone(),
                        reason: reason.clone(),
                    });
                }
                // 不应该出现，按失败统计保证计数守恒
                TaskStatus::Queued => {
                    result.failed += 1;
                    result.failures.push(FailedTask {
                        url: task.url.clone(),
                        output_path: task.output_path.clone(),
                        reason: "任务未执行".to_string(),
                    });
                }
            }
        }

        result.tasks = tasks;
        result
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
