//! Error taxonomy for the navigation engine
//!
//! Transient failures (transport, HTTP status, API error envelopes) are
//! absorbed by the paging loop. Schema violations mean the backend broke its
//! contract and always reach the caller.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NavError>;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint}: HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("{endpoint}: API server returned error: {message}")]
    Api { endpoint: String, message: String },

    #[error("{endpoint}: API response did not match schema: {source}")]
    Schema {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl NavError {
    pub fn schema(endpoint: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Schema {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Whether a retry or a later page might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::Api { .. }
        )
    }
}
