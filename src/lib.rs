//! # Tweetsearch Library
//!
//! A fluent client for the Twitter search API. A query is built up from authors,
//! recipients, mentions, hashtags and keywords plus optional filters (language,
//! locale, status id window, geocode, result type, paging), then sent as a single
//! GET request whose response is decoded into a list of [`Status`] records.
//!
//! ## Features
//!
//! - Chainable, value-based [`SearchQuery`] builder
//! - JSON and XML (`xml` feature, on by default) responses normalised to one shape
//! - Typed [`SearchError`]s carrying the HTTP status and response diagnostics
//! - Trends lookup
//! - Structured logging through the `log` facade
//!
//! ## Configuration
//!
//! [`SearchConfig::from_env`] reads the optional `SEARCH_API_URL`, `SEARCH_TRENDS_URL`,
//! `SEARCH_FORMAT`, `SEARCH_USER_AGENT`, `SEARCH_CLIENT_URL` and `SEARCH_TIMEOUT_SECS`
//! environment variables.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tweetsearch::{SearchClient, SearchQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tweetsearch::SearchError> {
//!     let mut client = SearchClient::from_env()?;
//!     let mut query = SearchQuery::new().from_user("@rustlang").contains("release");
//!     for status in client.results(&mut query).await? {
//!         println!("{:?}", status.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod twitter;

// Re-export commonly used types and functions
pub use config::{get_request_timeout, SearchConfig};
pub use error::SearchError;
pub use twitter::{
    DistanceUnit, Format, FormatDecoder, Geocode, HttpResponse, HttpTransport, ResponseDecoder,
    ResponseInfo, ResultType, SearchClient, SearchOptions, SearchQuery, Status, Token, Transport,
};
