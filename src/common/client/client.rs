use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{
    Client, ClientBuilder, Response, Url,
    header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::debug;

use super::error::TransportError;
use super::models::{FetchResponse, ResourceInfo};
use super::transport::Transport;
use crate::common::models::DownloadConfig;

// 所有下载任务共享同一个客户端（同一个连接池）
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new(config: &DownloadConfig) -> Result<Self, TransportError> {
        let inner = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(Self::get_default_headers(&config.user_agent)?)
            .build()?;

        Ok(Self { inner })
    }

    pub fn get_default_headers(user_agent: &str) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| TransportError::InvalidHeader(e.to_string()))?,
        );
        Ok(headers)
    }

    fn parse_url(url: &str) -> Result<Url, TransportError> {
        Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", url, e)))
    }

    fn content_type(response: &Response) -> Option<String> {
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|ct| ct.to_string())
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn head(&self, url: &str) -> Result<ResourceInfo, TransportError> {
        let resp = self.inner.head(Self::parse_url(url)?).send().await?;

        // HEAD 响应没有响应体，这里直接读 Content-Length 头
        let content_length = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|ct_len| ct_len.to_str().ok())
            .and_then(|ct_len| ct_len.parse().ok());

        let info = ResourceInfo {
            status: resp.status().as_u16(),
            content_type: Self::content_type(&resp),
            content_length,
        };
        debug!("HEAD {} -> {}", url, info.status);
        Ok(info)
    }

    async fn get_stream(&self, url: &str) -> Result<FetchResponse, TransportError> {
        let resp = self.inner.get(Self::parse_url(url)?).send().await?;
        debug!("GET {} -> {}", url, resp.status());

        Ok(FetchResponse {
            status: resp.status().as_u16(),
            content_type: Self::content_type(&resp),
            body: Box::pin(resp.bytes_stream().map(|chunk| chunk.map_err(TransportError::from))),
        })
    }
}
