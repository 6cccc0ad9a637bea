use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[default]
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), method: Method::Get, headers: Vec::new(), body: None, timeout: None }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self { method: Method::Post, body: Some(body.into()), ..Self::get(url) }
    }

    pub fn headers<'a, I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        self.headers.extend(headers.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn memo_key(&self) -> String {
        format!("{:?}|{}|{}", self.method, self.url, self.body.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub text: String,
}

/// Network access as seen by the pipeline. Every suspension point of an
/// operation goes through here.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        (**self).fetch(request).await
    }
}

/// `reqwest` backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("streamdex/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client, default_timeout: Duration::from_secs(15) }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (k, v) in &request.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        builder = builder.timeout(request.timeout.unwrap_or(self.default_timeout));

        tracing::debug!(method = ?request.method, url = %request.url, "fetching");
        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::request(&request.url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: request.url.clone(), status: status.as_u16() });
        }
        let url = response.url().to_string();
        let text = response.text().await.map_err(|e| FetchError::Body {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;
        Ok(FetchResponse { url, status: status.as_u16(), text })
    }
}

/// Deduplicates identical requests for the lifetime of one operation.
/// Failures are not remembered.
pub struct MemoFetcher<'a> {
    inner: &'a dyn Fetcher,
    memo: Mutex<HashMap<String, FetchResponse>>,
}

impl<'a> MemoFetcher<'a> {
    pub fn new(inner: &'a dyn Fetcher) -> Self {
        Self { inner, memo: Mutex::new(HashMap::new()) }
    }

    fn lookup(&self, key: &str) -> Option<FetchResponse> {
        self.memo.lock().ok().and_then(|m| m.get(key).cloned())
    }
}

#[async_trait]
impl Fetcher for MemoFetcher<'_> {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let key = request.memo_key();
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }
        let response = self.inner.fetch(request).await?;
        if let Ok(mut m) = self.memo.lock() {
            m.insert(key, response.clone());
        }
        Ok(response)
    }
}

/// Persists GET responses in a [`Storage`] for `ttl_secs`. Storage problems
/// are logged and bypassed, never surfaced as fetch faults.
pub struct CachedFetcher<S> {
    inner: Arc<dyn Fetcher>,
    storage: S,
    ttl_secs: i64,
}

impl<S: Storage> CachedFetcher<S> {
    pub fn new(inner: Arc<dyn Fetcher>, storage: S, ttl_secs: i64) -> Self {
        Self { inner, storage, ttl_secs }
    }

    pub fn storage(&self) -> &S { &self.storage }
}

#[async_trait]
impl<S: Storage> Fetcher for CachedFetcher<S> {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        if request.method != Method::Get {
            return self.inner.fetch(request).await;
        }
        let key = format!("fetch|{}", request.url);
        let now = current_epoch();
        match self.storage.get_cache(&key, now).await {
            Ok(Some(payload)) => match serde_json::from_str::<FetchResponse>(&payload) {
                Ok(hit) => {
                    tracing::debug!(url = %request.url, "fetch cache hit");
                    return Ok(hit);
                }
                Err(e) => tracing::debug!(url = %request.url, error = %e, "discarding unreadable cache entry"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "fetch cache lookup failed"),
        }

        let response = self.inner.fetch(request).await?;
        match serde_json::to_string(&response) {
            Ok(payload) => {
                if let Err(e) = self.storage.put_cache(&key, &payload, now + self.ttl_secs).await {
                    tracing::warn!(url = %request.url, error = %e, "fetch cache store failed");
                }
            }
            Err(e) => tracing::warn!(url = %request.url, error = %e, "fetch response not cacheable"),
        }
        Ok(response)
    }
}

pub(crate) fn current_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
