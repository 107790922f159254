//! HTTP fetcher implementation
//!
//! This module handles page requests for the pipeline:
//! - Building the shared HTTP client from the request configuration
//! - Issuing page requests with the configured method and headers
//! - Classifying transport failures and non-2xx responses

use crate::config::RequestConfig;
use crate::GetJsError;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use std::future::Future;
use url::Url;

/// User agent sent unless the configuration overrides it with a header
const USER_AGENT: &str = concat!("getjs/", env!("CARGO_PKG_VERSION"));

/// Builds an HTTP client with the configured timeout and TLS policy
///
/// The client is built once before any fetch starts and shared by every
/// task; nothing mutates it afterwards.
///
/// # Example
///
/// ```no_run
/// use getjs::config::RequestConfig;
/// use getjs::crawler::build_http_client;
///
/// let client = build_http_client(&RequestConfig::default()).unwrap();
/// ```
pub fn build_http_client(request: &RequestConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(request.timeout)
        .connect_timeout(request.timeout)
        .danger_accept_invalid_certs(request.insecure)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Source of page bodies
pub trait PageFetcher: Send + Sync + 'static {
    /// Fetches the body of a page
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, GetJsError>> + Send;
}

/// Fetches pages over HTTP with the configured method and headers
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    method: Method,
    headers: HeaderMap,
}

impl HttpFetcher {
    pub fn new(client: Client, request: &RequestConfig) -> Self {
        Self {
            client,
            method: request.method.clone(),
            headers: request.headers.clone(),
        }
    }
}

impl PageFetcher for HttpFetcher {
    /// # Errors
    ///
    /// | Condition                      | Error                     |
    /// |--------------------------------|---------------------------|
    /// | Connect error, timeout, TLS    | `GetJsError::Fetch`       |
    /// | Status outside 200..300        | `GetJsError::HttpStatus`  |
    /// | Body cannot be read or decoded | `GetJsError::Fetch`       |
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, GetJsError> {
        let response = self
            .client
            .request(self.method.clone(), url.clone())
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|source| GetJsError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GetJsError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| GetJsError::Fetch {
            url: url.to_string(),
            source,
        })?;

        Ok(body.to_vec())
    }
}
