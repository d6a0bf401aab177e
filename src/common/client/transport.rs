use async_trait::async_trait;
use futures::StreamExt;

use super::error::TransportError;
use super::models::{FetchResponse, ResourceInfo};

// 下载器、探测器和清单解析只依赖这两个能力：
// 按 URL 拉取字节流，以及按 URL 检查资源是否存在
#[async_trait]
pub trait Transport: Send + Sync {
    // 轻量的存在性检查（HEAD）
    async fn head(&self, url: &str) -> Result<ResourceInfo, TransportError>;

    // 流式 GET
    async fn get_stream(&self, url: &str) -> Result<FetchResponse, TransportError>;

    /// 2xx 视为存在，其余状态码视为不存在；网络错误原样返回
    async fn exists(&self, url: &str) -> Result<bool, TransportError> {
        Ok(self.head(url).await?.is_success())
    }

    /// 读取完整响应体，只用于清单这类小文件
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.get_stream(url).await?;
        if !response.is_success() {
            return Err(TransportError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }

        let mut body = response.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}
