/*!
Backend interface used by the request orchestrator.

This module defines:
- `RequestError`: why a backend operation failed.
- `PathBackend`: an async trait with the four backend operations.

Implementations hide transport details and return validated entities.
*/

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::backend::wire::{CompareRequest, GenerateRequest, OptimizeRequest, RunTestsRequest};
use crate::network::{
    network_graph::Graph,
    results::{ComparisonResult, OptimizationResult, TestStatistics},
};

/// Error type for backend operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RequestError {
    /// The backend answered with `success: false`.
    #[error("{0}")]
    Backend(String),
    /// The response parsed as JSON but did not match the expected schema.
    #[error("malformed response: {0}")]
    Schema(String),
    /// The request failed outright (connection, HTTP or body parse failure).
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {}", humantime::format_duration(*.0))]
    TimedOut(Duration),
}

impl RequestError {
    /// Message suitable for a user notification. Transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            RequestError::Backend(msg) => msg.clone(),
            RequestError::Schema(_) => "The server sent an unexpected response".to_string(),
            RequestError::Transport(_) => {
                "Could not reach the server. Check that the backend is running.".to_string()
            }
            RequestError::TimedOut(_) => self.to_string(),
        }
    }
}

/// Convenience result alias for backend operations.
pub type BackendResult<T> = Result<T, RequestError>;

#[async_trait]
pub trait PathBackend: Send + Sync {
    async fn generate_network(&self, request: &GenerateRequest) -> BackendResult<Graph>;
    async fn optimize(&self, request: &OptimizeRequest) -> BackendResult<OptimizationResult>;
    async fn compare_algorithms(&self, request: &CompareRequest)
    -> BackendResult<ComparisonResult>;
    async fn run_tests(&self, request: &RunTestsRequest) -> BackendResult<TestStatistics>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_detail_hidden_from_user() {
        let err =
            RequestError::Transport("tcp connect error: Connection refused (os error 111)".into());
        assert!(!err.user_message().contains("os error"));
        let err = RequestError::Backend("Kaynak ve hedef arasında yol yok".into());
        assert_eq!(err.user_message(), "Kaynak ve hedef arasında yol yok");
    }

    #[test]
    fn test_timeout_message() {
        let err = RequestError::TimedOut(Duration::from_secs(60));
        assert_eq!(err.user_message(), "request timed out after 1m");
    }
}
