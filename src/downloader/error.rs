use thiserror::Error;

use crate::common::client::TransportError;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("传输错误: {0}")]
    Transport(#[from] TransportError),

    #[error("HTTP 请求失败，状态码: {status}，URL: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("下载已取消")]
    Cancelled,

    #[error("无效的配置: {0}")]
    InvalidConfig(String),

    #[error("信号量错误")]
    SemaphoreError,
}
