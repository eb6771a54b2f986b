//! The injected HTTP collaborator. The engine hands a fully built request to
//! a [`Transport`] and interprets nothing about the response beyond its
//! status code; retries, auth, and timeouts all live behind this trait.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use tributary_core::types::HttpMethod;

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub reason: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("timeout")]
    Timeout,
    #[error("connect/dns/tls error: {0}")]
    Network(String),
    #[error("http error: {0}")]
    Other(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// The resolution engine imposes no timeout of its own; whatever bound
    /// the caller wants lives here on the client.
    pub fn new(timeout: Duration) -> Self {
        // Client creation should never fail in practice, but if it does, we'll get a better error
        // when trying to use it rather than panicking at initialization.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("tributary-exec/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                panic!("failed to create reqwest HTTP client: {e}. This is a bug - please report it.");
            });
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, TransportError> {
        // Fixed verb set; no string-to-method dispatch.
        let method = match req.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut rb = self.client.request(method, req.url);
        for (k, v) in req.headers {
            rb = rb.header(k, v);
        }
        if !req.query.is_empty() {
            rb = rb.query(&req.query);
        }
        if let Some(body) = req.body {
            rb = rb.json(&body);
        }

        let resp = rb.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();
        let reason = resp.status().canonical_reason().map(str::to_string);
        let body = resp.bytes().await.map_err(map_reqwest_error)?.to_vec();

        Ok(TransportResponse {
            status,
            reason,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        return TransportError::Timeout;
    }
    if e.is_connect() || e.is_request() {
        return TransportError::Network(e.to_string());
    }
    TransportError::Other(e.to_string())
}
