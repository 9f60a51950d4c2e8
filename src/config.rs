//! Configuration module for the search client.
//!
//! This module contains the configuration structure and environment variable handling
//! for talking to the Twitter search API: endpoints, response format, client
//! identification headers and the request timeout.

use log::{debug, error, info, warn};
use std::env;
use std::time::Duration;

use crate::error::SearchError;
use crate::twitter::Format;

/// Default search endpoint, without the format extension.
pub const DEFAULT_SEARCH_URL: &str = "http://search.twitter.com/search";

/// Default trends endpoint, without the `.json` extension.
pub const DEFAULT_TRENDS_URL: &str = "http://search.twitter.com/trends";

/// Name sent in the `X-Twitter-Client` header.
pub const CLIENT_NAME: &str = "tweetsearch";

/// Version sent in the `X-Twitter-Client-Version` header.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Redirects followed before a request is abandoned.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Configuration struct for the search client.
///
/// Holds everything the client needs besides the query itself. The response
/// format is kept as the raw configured string and only resolved when a request
/// is made, so a bad value surfaces as [`SearchError::Configuration`] from the
/// terminal call rather than at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Search endpoint without extension; `.json` or `.xml` is appended per request
    pub search_url: String,
    /// Trends endpoint without extension; `.json` is always appended
    pub trends_url: String,
    /// Response format, `json` or `xml`
    pub format: String,
    /// User-Agent header value. Twitter asks for a way to contact the caller here.
    pub user_agent: String,
    /// Optional value for the `X-Twitter-Client-URL` header
    pub client_url: Option<String>,
    /// Additional headers sent with every request
    pub extra_headers: Vec<(String, String)>,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Maximum number of redirects to follow
    pub max_redirects: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            trends_url: DEFAULT_TRENDS_URL.to_string(),
            format: Format::Json.to_string(),
            user_agent: format!("{}/{}", CLIENT_NAME, CLIENT_VERSION),
            client_url: None,
            extra_headers: Vec::new(),
            timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl SearchConfig {
    /// Creates a new `SearchConfig` from environment variables, falling back to defaults.
    ///
    /// # Optional Environment Variables
    ///
    /// - `SEARCH_API_URL`: search endpoint without extension
    /// - `SEARCH_TRENDS_URL`: trends endpoint without extension
    /// - `SEARCH_FORMAT`: `json` (default) or `xml`
    /// - `SEARCH_USER_AGENT`: User-Agent header value
    /// - `SEARCH_CLIENT_URL`: value for the `X-Twitter-Client-URL` header
    /// - `SEARCH_TIMEOUT_SECS`: request timeout in seconds (see [`get_request_timeout`])
    ///
    /// # Returns
    ///
    /// - `Ok(SearchConfig)`: If every variable that is set holds a usable value
    /// - `Err(SearchError::Configuration)`: If an endpoint is not a valid URL or the timeout
    ///   cannot be parsed
    ///
    /// The format is not checked here; see [`SearchConfig::format`].
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use tweetsearch::SearchConfig;
    ///
    /// std::env::set_var("SEARCH_FORMAT", "xml");
    /// let config = SearchConfig::from_env().unwrap();
    /// assert_eq!(config.format, "xml");
    /// ```
    pub fn from_env() -> Result<Self, SearchError> {
        info!("Loading search configuration from environment variables");
        let mut config = SearchConfig::default();

        if let Some(url) = non_empty_var("SEARCH_API_URL") {
            info!("Found SEARCH_API_URL environment variable");
            config.search_url = url;
        }
        if let Some(url) = non_empty_var("SEARCH_TRENDS_URL") {
            info!("Found SEARCH_TRENDS_URL environment variable");
            config.trends_url = url;
        }
        if let Some(format) = non_empty_var("SEARCH_FORMAT") {
            info!("Found SEARCH_FORMAT environment variable: {}", format);
            config.format = format;
        }
        match non_empty_var("SEARCH_USER_AGENT") {
            Some(agent) => {
                debug!("Using user agent from SEARCH_USER_AGENT: {}", agent);
                config.user_agent = agent;
            }
            None => {
                warn!("No SEARCH_USER_AGENT set - consider including a contact address so Twitter can reach you in case of abuse");
            }
        }
        config.client_url = non_empty_var("SEARCH_CLIENT_URL");
        config.timeout = get_request_timeout()?;

        config.validate()?;

        info!(
            "Search configuration loaded: endpoint {}, format {}, timeout {:?}",
            config.search_url, config.format, config.timeout
        );
        Ok(config)
    }

    /// Checks that both endpoints are absolute http(s) URLs.
    pub fn validate(&self) -> Result<(), SearchError> {
        for (name, value) in [("search", &self.search_url), ("trends", &self.trends_url)] {
            let parsed = url::Url::parse(value).map_err(|e| {
                error!("Invalid {} endpoint '{}': {}", name, value, e);
                SearchError::Configuration(format!("invalid {} endpoint '{}': {}", name, value, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SearchError::Configuration(format!(
                    "{} endpoint '{}' must use http or https",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Resolves the configured format string.
    ///
    /// # Returns
    ///
    /// - `Ok(Format)`: For `json` or `xml` (case-insensitive)
    /// - `Err(SearchError::Configuration)`: For anything else
    pub fn format(&self) -> Result<Format, SearchError> {
        self.format.parse().map_err(|_| {
            error!("Unsupported response format '{}'", self.format);
            SearchError::Configuration(format!(
                "unsupported response format '{}' (expected json or xml)",
                self.format
            ))
        })
    }

    /// Full search URL for the given format, e.g. `http://search.twitter.com/search.json`.
    pub fn search_endpoint(&self, format: Format) -> String {
        format!(
            "{}.{}",
            self.search_url.trim_end_matches('/'),
            format.extension()
        )
    }

    /// Full trends URL. Trends are only served as JSON.
    pub fn trends_endpoint(&self) -> String {
        format!(
            "{}.{}",
            self.trends_url.trim_end_matches('/'),
            Format::Json.extension()
        )
    }

    /// Client identification headers followed by any extra headers.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("X-Twitter-Client".to_string(), CLIENT_NAME.to_string()),
            (
                "X-Twitter-Client-Version".to_string(),
                CLIENT_VERSION.to_string(),
            ),
        ];
        if let Some(url) = &self.client_url {
            headers.push(("X-Twitter-Client-URL".to_string(), url.clone()));
        }
        headers.extend(self.extra_headers.iter().cloned());
        headers
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Gets the request timeout from the `SEARCH_TIMEOUT_SECS` environment variable.
///
/// Fractional values are accepted (`0.5` is half a second).
///
/// # Returns
///
/// - `Ok(Some(Duration))`: If the variable is set to a positive number
/// - `Ok(None)`: If the variable is unset or empty (no timeout)
/// - `Err(SearchError::Configuration)`: If the value is not a positive number
///
/// # Example
///
/// ```rust
/// use tweetsearch::get_request_timeout;
///
/// std::env::remove_var("SEARCH_TIMEOUT_SECS");
/// assert_eq!(get_request_timeout().unwrap(), None);
/// ```
pub fn get_request_timeout() -> Result<Option<Duration>, SearchError> {
    let raw = match non_empty_var("SEARCH_TIMEOUT_SECS") {
        Some(raw) => raw,
        None => return Ok(None),
    };

    let secs: f64 = raw.parse().map_err(|e| {
        SearchError::Configuration(format!("SEARCH_TIMEOUT_SECS '{}' is not a number: {}", raw, e))
    })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(SearchError::Configuration(format!(
            "SEARCH_TIMEOUT_SECS must be positive, got '{}'",
            raw
        )));
    }

    let timeout = Duration::try_from_secs_f64(secs).map_err(|e| {
        SearchError::Configuration(format!("SEARCH_TIMEOUT_SECS '{}' is too large: {}", raw, e))
    })?;

    debug!("Request timeout set to {} seconds", secs);
    Ok(Some(timeout))
}
