//! JSON-over-HTTP transport.
//!
//! Each call is one POST of `{"controller", "method", ...params}` to the
//! configured endpoint. The reply body is the [`Response`] envelope
//! `{"data", "code", "type"}`.

use super::{Request, Response, Transport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{instrument, warn};

/// Transport over `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(controller = %request.controller, method = %request.method))]
    async fn call(&self, request: Request) -> Result<Response> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Request failed");
                Error::Transport(format!("Request error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Request failed with status");
            return Err(Error::Transport(format!("HTTP status {}", status)));
        }

        response
            .json::<Response>()
            .await
            .map_err(|e| Error::Transport(format!("Invalid response body: {}", e)))
    }
}
