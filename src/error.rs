//! Error types for the search client.
//!
//! Every terminal call on [`SearchClient`](crate::SearchClient) reports failure through
//! [`SearchError`]. Builder calls on [`SearchQuery`](crate::SearchQuery) never fail; their
//! input is checked once, when the request is built.

use thiserror::Error;

use crate::twitter::{Format, ResponseInfo};

/// Everything that can go wrong while building, sending or decoding a search request.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The API answered with something other than `200 OK`. The body is never read.
    #[error("request to {url} failed with HTTP status {status}")]
    Status {
        status: u16,
        url: String,
        info: ResponseInfo,
    },

    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Connection, redirect or body-read failure below the HTTP status level.
    #[error("network error while requesting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The body could not be decoded under the configured format.
    #[error("failed to decode {format} response: {message}")]
    Decode { format: Format, message: String },

    /// The client is configured in a way it cannot honour.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The query or one of its options is out of range.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl SearchError {
    /// Returns `true` for failures of the request itself (status, timeout, network).
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            SearchError::Status { .. } | SearchError::Timeout { .. } | SearchError::Network { .. }
        )
    }

    /// The HTTP status code, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn decode(format: Format, message: impl Into<String>) -> Self {
        SearchError::Decode {
            format,
            message: message.into(),
        }
    }
}
