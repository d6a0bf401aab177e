use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

use super::error::TransportError;

/// 响应体的字节流，按块读取，不会一次性缓存整个文件
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// HEAD 请求得到的资源信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

impl ResourceInfo {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// GET 请求的响应：状态码、内容类型和字节流
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}
