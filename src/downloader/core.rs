use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::DownloadError;
use super::models::{BatchResult, DownloadBatch, DownloadTask, TaskStatus};
use super::progress::ProgressSink;
use crate::common::client::Transport;
use crate::common::models::DownloadConfig;

/// 有界并发下载器
///
/// 所有任务一次性提交，信号量保证同时传输的任务不超过 `max_concurrent` 个。
/// 单个任务失败不会中断整批任务。
#[derive(Clone)]
pub struct DownloadCore {
    transport: Arc<dyn Transport>,
    semaphore: Arc<Semaphore>, // 控制并发数
    chunk_size: usize,
    cancel_token: CancellationToken,
}

impl DownloadCore {
    pub fn new(
        transport: Arc<dyn Transport>,
        max_concurrent: usize,
        chunk_size: usize,
    ) -> Result<Self, DownloadError> {
        if max_concurrent == 0 {
            return Err(DownloadError::InvalidConfig("并发数必须大于 0".to_string()));
        }
        if chunk_size == 0 {
            return Err(DownloadError::InvalidConfig(
                "缓冲块大小必须大于 0".to_string(),
            ));
        }

        Ok(Self {
            transport,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            chunk_size,
            cancel_token: CancellationToken::new(),
        })
    }

    pub fn from_config(
        transport: Arc<dyn Transport>,
        config: &DownloadConfig,
    ) -> Result<Self, DownloadError> {
        Self::new(transport, config.concurrency, config.chunk_size)
    }

    pub fn with_cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    // 执行一批下载任务，所有任务结束后返回汇总结果
    pub async fn run(&self, batch: DownloadBatch, progress: Arc<dyn ProgressSink>) -> BatchResult {
        let total = batch.len();
        progress.on_batch_start(total);

        if total == 0 {
            let result = BatchResult::default();
            progress.on_batch_finish(&result);
            return result;
        }

        info!("开始下载 {} 个文件", total);

        // 保留一份原始任务，任务异常退出时用来补记失败
        let mut slots: Vec<Option<DownloadTask>> = (0..total).map(|_| None).collect();
        let originals = batch.clone();

        let mut join_set = JoinSet::new();
        for (index, task) in batch.into_iter().enumerate() {
            let core = self.clone();
            let progress = Arc::clone(&progress);
            join_set.spawn(async move {
                let task = core.run_task(task).await;
                // 文件已经落盘之后才上报
                progress.on_task_finished(&task);
                (index, task)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, task)) => slots[index] = Some(task),
                Err(e) => error!("下载任务异常退出: {}", e),
            }
        }

        let tasks: Vec<DownloadTask> = slots
            .into_iter()
            .zip(originals)
            .map(|(slot, mut original)| {
                slot.unwrap_or_else(|| {
                    original.status = TaskStatus::Failed("任务异常终止".to_string());
                    original
                })
            })
            .collect();

        let result = BatchResult::from_tasks(tasks);
        info!(
            "下载结束: 共 {} 个, 成功 {} 个, 失败 {} 个",
            result.attempted, result.succeeded, result.failed
        );
        progress.on_batch_finish(&result);
        result
    }

    async fn run_task(&self, mut task: DownloadTask) -> DownloadTask {
        debug!("开始下载任务: {} -> {}", task.url, task.output_path.display());

        match self.acquire_and_download(&task).await {
            Ok(downloaded) => {
                task.status = TaskStatus::Completed;
                info!("✅ 下载完成: {} ({} 字节)", task.output_path.display(), downloaded);
            }
            Err(DownloadError::Cancelled) => {
                task.status = TaskStatus::Failed(DownloadError::Cancelled.to_string());
                warn!("⏭️ 下载已取消: {}", task.url);
            }
            Err(e) => {
                task.status = TaskStatus::Failed(e.to_string());
                error!("❌ 下载任务失败: {}, 错误: {}", task.url, e);
            }
        }
        task
    }

    async fn acquire_and_download(&self, task: &DownloadTask) -> Result<u64, DownloadError> {
        if self.cancel_token.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| DownloadError::SemaphoreError)?;

        // 排队期间可能已经取消
        if self.cancel_token.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let part_path = part_path_for(&task.output_path);
        let result = tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => Err(DownloadError::Cancelled),
            result = self.download_to_file(&task.url, &part_path, &task.output_path) => result,
        };

        if result.is_err() {
            // 不留下写了一半的文件
            if let Err(e) = tokio::fs::remove_file(&part_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("清理临时文件失败: {}, 错误: {}", part_path.display(), e);
                }
            }
        }
        result
    }

    // 流式写入临时文件，刷盘后再改名为目标文件
    async fn download_to_file(
        &self,
        url: &str,
        part_path: &Path,
        output_path: &Path,
    ) -> Result<u64, DownloadError> {
        let response = self.transport.get_stream(url).await?;
        if !response.is_success() {
            return Err(DownloadError::HttpStatus {
                status: response.status,
                url: url.to_string(),
            });
        }

        let file = tokio::fs::File::create(part_path).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut stream = response.body;

        let mut downloaded = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }

        writer.flush().await?;
        let file = writer.into_inner();
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(part_path, output_path).await?;
        Ok(downloaded)
    }
}

// 和目标文件放在同一目录，保证改名是原子的
fn part_path_for(output_path: &Path) -> PathBuf {
    let file_name = output_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_path.with_file_name(format!(
        ".{}.{}.part",
        file_name,
        uuid::Uuid::new_v4().simple()
    ))
}
