use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::source::{BackendResult, PathBackend, RequestError};
use super::wire::{
    self, COMPARE_ENDPOINT, CompareRequest, GENERATE_ENDPOINT, GenerateRequest, OPTIMIZE_ENDPOINT,
    OptimizeRequest, RUN_TESTS_ENDPOINT, RunTestsRequest,
};
use crate::network::{
    network_graph::Graph,
    results::{ComparisonResult, OptimizationResult, TestStatistics},
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the optimization backend.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for the backend rooted at `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: &str) -> Result<Self, RequestError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RequestError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// POSTs a JSON body and returns the response body as untyped JSON.
    ///
    /// Error statuses are not treated as failures here: the backend answers 400/500 with the
    /// usual `success: false` envelope, which the wire layer turns into a `Backend` error.
    async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> BackendResult<Value> {
        let url = self.url(endpoint);
        tracing::debug!("[backend] POST {url}");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RequestError::Transport(format!("POST {url}: {e}")))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RequestError::Transport(format!("reading {url}: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            RequestError::Transport(format!("{url} answered {status} with a non-JSON body: {e}"))
        })
    }
}

#[async_trait]
impl PathBackend for HttpBackend {
    async fn generate_network(&self, request: &GenerateRequest) -> BackendResult<Graph> {
        let value = self.post(GENERATE_ENDPOINT, request).await?;
        wire::parse_generate_response(value)
    }

    async fn optimize(&self, request: &OptimizeRequest) -> BackendResult<OptimizationResult> {
        let value = self.post(OPTIMIZE_ENDPOINT, request).await?;
        wire::parse_optimize_response(value, &request.algorithm)
    }

    async fn compare_algorithms(
        &self,
        request: &CompareRequest,
    ) -> BackendResult<ComparisonResult> {
        let value = self.post(COMPARE_ENDPOINT, request).await?;
        wire::parse_compare_response(value)
    }

    async fn run_tests(&self, request: &RunTestsRequest) -> BackendResult<TestStatistics> {
        let value = self.post(RUN_TESTS_ENDPOINT, request).await?;
        wire::parse_run_tests_response(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let backend = HttpBackend::new("http://127.0.0.1:5000/").unwrap();
        assert_eq!(backend.base_url(), "http://127.0.0.1:5000");
        assert_eq!(
            backend.url(OPTIMIZE_ENDPOINT),
            "http://127.0.0.1:5000/api/optimize"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 9 (discard) is closed on test machines; the connection is refused
        let backend = HttpBackend::new("http://127.0.0.1:9").unwrap();
        let result = backend.run_tests(&RunTestsRequest { num_tests: 1 }).await;
        assert!(matches!(result, Err(RequestError::Transport(_))));
    }
}
