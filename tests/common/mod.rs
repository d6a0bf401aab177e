#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::Poll;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream};

use ebook_fetcher::common::client::{FetchResponse, ResourceInfo, Transport, TransportError};

fn not_found() -> FetchResponse {
    FetchResponse {
        status: 404,
        content_type: None,
        body: Box::pin(stream::empty()),
    }
}

/// 存在性预言机：`prefix + 编号 + suffix` 且编号 <= max 时存在
pub struct OracleTransport {
    prefix: String,
    suffix: String,
    max: i64,
    pub head_calls: AtomicUsize,
}

impl OracleTransport {
    pub fn new(prefix: &str, suffix: &str, max: i64) -> Self {
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            max,
            head_calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for OracleTransport {
    async fn head(&self, url: &str) -> Result<ResourceInfo, TransportError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let number = url
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_suffix(self.suffix.as_str()))
            .and_then(|n| n.trim().parse::<i64>().ok());

        let status = match number {
            Some(n) if n >= 0 && n <= self.max => 200,
            _ => 404,
        };
        Ok(ResourceInfo {
            status,
            content_type: Some("image/png".to_string()),
            content_length: None,
        })
    }

    async fn get_stream(&self, url: &str) -> Result<FetchResponse, TransportError> {
        Err(TransportError::Stream(format!("unexpected GET {}", url)))
    }
}

/// 第 `fail_after` 次 HEAD 之后返回网络错误
pub struct FlakyTransport {
    inner: OracleTransport,
    fail_after: usize,
}

impl FlakyTransport {
    pub fn new(inner: OracleTransport, fail_after: usize) -> Self {
        Self { inner, fail_after }
    }
}

#[async_trait]
impl Transport for FlakyTransport {
    async fn head(&self, url: &str) -> Result<ResourceInfo, TransportError> {
        if self.inner.calls() >= self.fail_after {
            return Err(TransportError::Stream("connection reset by peer".to_string()));
        }
        self.inner.head(url).await
    }

    async fn get_stream(&self, url: &str) -> Result<FetchResponse, TransportError> {
        self.inner.get_stream(url).await
    }
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 统计同时在传输的请求数；URL 以 `missing` 结尾时返回 404
pub struct InstrumentedTransport {
    active: Arc<AtomicUsize>,
    peak: AtomicUsize,
    delay: Duration,
}

impl InstrumentedTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            peak: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for InstrumentedTransport {
    async fn head(&self, _url: &str) -> Result<ResourceInfo, TransportError> {
        Ok(ResourceInfo {
            status: 200,
            content_type: None,
            content_length: None,
        })
    }

    async fn get_stream(&self, url: &str) -> Result<FetchResponse, TransportError> {
        if url.ends_with("missing") {
            return Ok(not_found());
        }

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        // guard 跟随响应流一起释放
        let guard = ActiveGuard(Arc::clone(&self.active));
        let delay = self.delay;
        let payload = Bytes::from(url.to_string());

        let head = stream::once(async move {
            tokio::time::sleep(delay).await;
            Ok::<Bytes, TransportError>(payload)
        });
        let tail = stream::poll_fn(move |_| {
            let _hold = &guard;
            Poll::<Option<Result<Bytes, TransportError>>>::Ready(None)
        });

        Ok(FetchResponse {
            status: 200,
            content_type: None,
            body: Box::pin(head.chain(tail)),
        })
    }
}

/// 先返回一块数据，然后连接中断
pub struct BrokenStreamTransport;

#[async_trait]
impl Transport for BrokenStreamTransport {
    async fn head(&self, _url: &str) -> Result<ResourceInfo, TransportError> {
        Ok(ResourceInfo {
            status: 200,
            content_type: None,
            content_length: None,
        })
    }

    async fn get_stream(&self, _url: &str) -> Result<FetchResponse, TransportError> {
        let chunks: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(TransportError::Stream("connection reset".to_string())),
        ];
        Ok(FetchResponse {
            status: 200,
            content_type: None,
            body: Box::pin(stream::iter(chunks)),
        })
    }
}
