//! HTTP transport for the analysis endpoint.
//!
//! The transport only moves bytes: it returns the status and raw body text and leaves
//! interpretation to the controller. Cancellation is cooperative via a token.

use crate::model::AnalysisRequest;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub const ANALYZE_PATH: &str = "api/analyze";
pub const HEALTH_PATH: &str = "healthz";

/// Status and unparsed body of an endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// The cancellation token fired before the exchange finished.
    #[error("request cancelled")]
    Cancelled,
    #[error("request to analysis endpoint failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Anything that can carry an [`AnalysisRequest`] to the remote endpoint.
pub trait AnalysisTransport {
    fn analyze(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<RawResponse, TransportError>>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    http: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Probe `/healthz`. Returns the trimmed body on a 2xx status.
    pub async fn health(&self) -> Result<String> {
        let url = self.endpoint(HEALTH_PATH);
        let res = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("send health probe to {url}"))?;
        let status = res.status();
        let body = res.text().await.context("read health probe body")?;
        if !status.is_success() {
            anyhow::bail!("health probe failed with status {status}: {}", body.trim());
        }
        Ok(body.trim().to_string())
    }
}

impl AnalysisTransport for HttpTransport {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, TransportError> {
        let url = self.endpoint(ANALYZE_PATH);
        tracing::debug!(%url, departure = %request.departure, arrival = %request.arrival, "dispatching analysis request");

        let exchange = async {
            // `.json()` sets `content-type: application/json`.
            let res = self.http.post(&url).json(request).send().await?;
            let status = res.status();
            let body = res.text().await?;
            Ok::<_, TransportError>(RawResponse { status, body })
        };

        // Dropping the exchange future aborts the in-flight request.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            res = exchange => res,
        }
    }
}
