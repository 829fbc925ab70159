// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP access to the remote data service.
//!
//! Only transport problems are errors here. Every HTTP status, 4xx and 5xx
//! included, comes back as an [`HttpResponse`] so callers decide what a
//! status means.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Status code and body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// Transport-level failures (no HTTP status was received)
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid request to {url}: {reason}")]
    InvalidRequest { url: String, reason: String },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Adapter for issuing HTTP requests.
///
/// Implementations hold no per-run state and may be shared by concurrent runs.
#[async_trait]
pub trait HttpAdapter: Clone + Send + Sync + 'static {
    /// GET `url` with the given query parameters
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError>;

    /// POST `body` as JSON to `url`
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError>;
}

/// HTTP adapter backed by a pooled `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestHttpAdapter {
    client: reqwest::Client,
}

impl ReqwestHttpAdapter {
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new() -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .build()
            .map_err(|e| HttpError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn finish(
        request: reqwest::RequestBuilder,
        url: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        let response = request.timeout(timeout).send().await.map_err(|e| classify(e, url, timeout))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(e, url, timeout))?;
        tracing::trace!(url, status, bytes = body.len(), "http response");
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpAdapter for ReqwestHttpAdapter {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        Self::finish(self.client.get(url).query(query), url, timeout).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<HttpResponse, HttpError> {
        Self::finish(self.client.post(url).json(body), url, timeout).await
    }
}

fn classify(err: reqwest::Error, url: &str, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout(timeout)
    } else if err.is_builder() {
        HttpError::InvalidRequest { url: url.to_string(), reason: err.to_string() }
    } else if err.is_connect() {
        HttpError::Connect(err.to_string())
    } else {
        HttpError::Transport(err.to_string())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{HttpAdapter, HttpError, HttpResponse};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use std::time::Duration;

    /// HTTP method of a recorded call
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum HttpMethod {
        Get,
        Post,
    }

    /// Recorded request
    #[derive(Debug, Clone)]
    pub struct HttpCall {
        pub method: HttpMethod,
        pub url: String,
        pub path: String,
        pub query: Vec<(String, String)>,
        pub body: Option<serde_json::Value>,
    }

    impl HttpCall {
        /// Value of query parameter `name`, if present
        pub fn param(&self, name: &str) -> Option<&str> {
            self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
        }
    }

    /// Scripted outcome for one request
    #[derive(Debug, Clone)]
    pub enum FakeReply {
        Respond(HttpResponse),
        /// Transport failure with the given message
        Fail(String),
    }

    impl FakeReply {
        pub fn status(status: u16) -> Self {
            FakeReply::Respond(HttpResponse::new(status, ""))
        }

        pub fn json(status: u16, body: impl Into<String>) -> Self {
            FakeReply::Respond(HttpResponse::new(status, body))
        }
    }

    type Handler = Arc<dyn Fn(&HttpCall) -> FakeReply + Send + Sync>;

    #[derive(Default)]
    struct FakeHttpState {
        calls: Vec<HttpCall>,
        queued: HashMap<String, VecDeque<FakeReply>>,
        handlers: HashMap<String, Handler>,
        fallbacks: HashMap<String, FakeReply>,
    }

    /// Fake HTTP adapter for testing.
    ///
    /// Replies are resolved per URL path: queued replies first (FIFO),
    /// then a handler, then a fallback, then `404`.
    #[derive(Clone, Default)]
    pub struct FakeHttpAdapter {
        inner: Arc<Mutex<FakeHttpState>>,
    }

    impl FakeHttpAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a one-shot reply for `path`
        pub fn push(&self, path: &str, reply: FakeReply) -> &Self {
            self.inner.lock().queued.entry(path.to_string()).or_default().push_back(reply);
            self
        }

        /// Compute replies for `path` from the request
        pub fn handle(
            &self,
            path: &str,
            handler: impl Fn(&HttpCall) -> FakeReply + Send + Sync + 'static,
        ) -> &Self {
            self.inner.lock().handlers.insert(path.to_string(), Arc::new(handler));
            self
        }

        /// Reply used for `path` once its queue is empty
        pub fn fallback(&self, path: &str, reply: FakeReply) -> &Self {
            self.inner.lock().fallbacks.insert(path.to_string(), reply);
            self
        }

        /// All recorded calls, in order
        pub fn calls(&self) -> Vec<HttpCall> {
            self.inner.lock().calls.clone()
        }

        /// Recorded calls to `path`
        pub fn calls_to(&self, path: &str) -> Vec<HttpCall> {
            self.inner.lock().calls.iter().filter(|c| c.path == path).cloned().collect()
        }

        fn dispatch(&self, call: HttpCall) -> Result<HttpResponse, HttpError> {
            // Handlers run outside the lock so they may inspect the fake.
            let (queued, handler, fallback) = {
                let mut state = self.inner.lock();
                state.calls.push(call.clone());
                let queued = state.queued.get_mut(&call.path).and_then(VecDeque::pop_front);
                let handler = state.handlers.get(&call.path).cloned();
                let fallback = state.fallbacks.get(&call.path).cloned();
                (queued, handler, fallback)
            };
            let reply = queued.or_else(|| handler.map(|h| h(&call))).or(fallback);
            match reply {
                Some(FakeReply::Respond(response)) => Ok(response),
                Some(FakeReply::Fail(message)) => Err(HttpError::Connect(message)),
                None => Ok(HttpResponse::new(404, r#"{"detail":"Not Found"}"#)),
            }
        }
    }

    fn path_of(url: &str) -> String {
        reqwest::Url::parse(url).map(|u| u.path().to_string()).unwrap_or_else(|_| url.to_string())
    }

    #[async_trait]
    impl HttpAdapter for FakeHttpAdapter {
        async fn get(
            &self,
            url: &str,
            query: &[(String, String)],
            _timeout: Duration,
        ) -> Result<HttpResponse, HttpError> {
            self.dispatch(HttpCall {
                method: HttpMethod::Get,
                url: url.to_string(),
                path: path_of(url),
                query: query.to_vec(),
                body: None,
            })
        }

        async fn post_json(
            &self,
            url: &str,
            body: &serde_json::Value,
            _timeout: Duration,
        ) -> Result<HttpResponse, HttpError> {
            self.dispatch(HttpCall {
                method: HttpMethod::Post,
                url: url.to_string(),
                path: path_of(url),
                query: Vec::new(),
                body: Some(body.clone()),
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeHttpAdapter, FakeReply, HttpCall, HttpMethod};

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
