//! Liveness check for completed script URLs
//!
//! A candidate resolves when a plain GET completes, its body can be drained
//! and the status is in `200..300`. Anything else drops the candidate.

use crate::GetJsError;
use reqwest::Client;
use std::future::Future;
use url::Url;

/// Decides whether a script URL is live
pub trait Resolver: Send + Sync + 'static {
    fn resolves(&self, url: &Url) -> impl Future<Output = bool> + Send;
}

/// Resolves URLs with a header-less GET on the shared client
///
/// The page fetch's method and headers are not applied here; only the
/// client's timeout and TLS policy are shared.
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: Client,
}

impl HttpResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetches the URL and reports why it does not resolve, if it doesn't
    pub async fn check(&self, url: &Url) -> Result<(), GetJsError> {
        let resolution_error = |reason: String| GetJsError::Resolution {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| resolution_error(e.to_string()))?;

        let status = response.status();
        response
            .bytes()
            .await
            .map_err(|e| resolution_error(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(resolution_error(format!("status {}", status.as_u16())));
        }

        Ok(())
    }
}

impl Resolver for HttpResolver {
    async fn resolves(&self, url: &Url) -> bool {
        match self.check(url).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Dropping candidate: {}", e);
                false
            }
        }
    }
}
