use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("无效的请求头: {0}")]
    InvalidHeader(String),

    #[error("HTTP 请求失败，状态码: {status}，URL: {url}")]
    Status { status: u16, url: String },

    #[error("读取响应流失败: {0}")]
    Stream(String),
}
