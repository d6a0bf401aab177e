use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("源目录不存在: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("压缩错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("遍历目录失败: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("无效的路径: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("打包任务异常退出: {0}")]
    Join(String),
}
