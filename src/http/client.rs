use std::time::{Duration, Instant};

use crate::http::request::HttpRequest;
use crate::http::response::Response;
use crate::http::types::Latency;
use crate::{HttpuError, Result};

#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
    timeout: Duration,
}

impl Client {
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpuError::Build(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { inner, timeout })
    }

    /// 发送请求，响应头到达即返回；Body 留给调用方读取
    async fn send(&self, request: HttpRequest, start: Instant) -> Result<reqwest::Response> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .inner
            .request(request.method, request.url)
            .headers(request.headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        builder.send().await.map_err(|e| self.classify(e, start))
    }

    /// 发送请求并读完整个 Body，超时覆盖两个阶段
    ///
    /// 耗时从 `start` 算到 Body 读完为止。
    pub async fn fetch(&self, request: HttpRequest, start: Instant) -> Result<Response> {
        let raw = self.send(request, start).await?;
        let status = raw.status().as_u16();
        let headers = raw.headers().clone();
        let body = raw.bytes().await.map_err(|e| self.classify(e, start))?;
        Response::new(status, headers, body.to_vec(), Latency::since(start))
    }

    /// 把 reqwest 的错误归类为超时、构建错误或网络错误
    ///
    /// 读 Body 时触发的总超时被包在解码错误里，已用时间超过超时设置的也算超时。
    fn classify(&self, err: reqwest::Error, start: Instant) -> HttpuError {
        if err.is_timeout() || start.elapsed() >= self.timeout {
            HttpuError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
        } else {
            err.into()
        }
    }
}
