//! Core HTTP utilities for the search API.
//!
//! This module contains the [`Transport`] seam the client sends requests through,
//! the reqwest-backed [`HttpTransport`], and the diagnostics recorded for every
//! response.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, Client};
use std::fmt::Debug;
use std::time::{Duration, Instant};

use crate::config::SearchConfig;
use crate::error::SearchError;

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_len`: Maximum length in characters before truncation
///
/// # Returns
///
/// A sanitized string safe for logging
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_len {
        let truncated: String = sanitized.chars().take(max_len).collect();
        format!(
            "{}... [truncated, {} total bytes]",
            truncated,
            text.len()
        )
    } else {
        sanitized
    }
}

/// Transport-level diagnostics for one completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseInfo {
    /// URL that produced the response, after redirects
    pub url: String,
    pub status: u16,
    /// Time from sending the request until the body was read
    pub elapsed: Duration,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// A response as returned by a [`Transport`], whatever its status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub info: ResponseInfo,
    pub body: String,
}

impl HttpResponse {
    /// Only `200 OK` counts as success.
    pub fn is_ok(&self) -> bool {
        self.info.status == 200
    }
}

/// Sends GET requests for the client.
///
/// Implementations return every HTTP status as `Ok`; errors are reserved for
/// requests that produced no response at all (network failure, timeout).
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, url: &str) -> Result<HttpResponse, SearchError>;
}

/// [`Transport`] backed by a `reqwest::Client`.
///
/// The client is built once with the configured user agent, identification
/// headers, redirect limit and timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the underlying HTTP client from `config`.
    ///
    /// # Returns
    ///
    /// - `Ok(HttpTransport)`: Ready to send requests
    /// - `Err(SearchError::Configuration)`: If a header name or value is invalid or the
    ///   client cannot be constructed
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let mut headers = HeaderMap::new();
        for (name, value) in config.headers() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                SearchError::Configuration(format!("invalid header name '{}': {}", name, e))
            })?;
            let header_value = HeaderValue::from_str(&value).map_err(|e| {
                SearchError::Configuration(format!("invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(header_name, header_value);
        }
        debug!("Default request headers: {:?}", headers);

        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(redirect::Policy::limited(config.max_redirects));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            SearchError::Configuration(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, SearchError> {
        let started = Instant::now();
        debug!("Sending GET request to {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        if final_url != url {
            info!("Request was redirected to {}", final_url);
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        let body = if status == 200 {
            response.text().await.map_err(|e| classify_error(url, e))?
        } else {
            String::new()
        };

        let info = ResponseInfo {
            url: final_url,
            status,
            elapsed: started.elapsed(),
            content_type,
            content_length,
        };
        debug!(
            "Response from {}: status {}, {} bytes in {:?}",
            info.url,
            info.status,
            body.len(),
            info.elapsed
        );

        Ok(HttpResponse { info, body })
    }
}

fn classify_error(url: &str, e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        warn!("Request to {} timed out", url);
        SearchError::Timeout {
            url: url.to_string(),
        }
    } else {
        error!("Request to {} failed: {}", url, e);
        SearchError::Network {
            url: url.to_string(),
            source: Box::new(e),
        }
    }
}
