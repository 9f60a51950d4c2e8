//! The search client.
//!
//! [`SearchClient`] turns a [`SearchQuery`] into one GET request against the
//! search endpoint and decodes the answer, or fetches the trends endpoint.

use log::{debug, error, info, warn};
use serde_json::Value;

use crate::config::SearchConfig;
use crate::error::SearchError;

use super::api::{sanitize_for_logging, HttpTransport, ResponseInfo, Transport};
use super::parsing::{FormatDecoder, ResponseDecoder, Status};
use super::query::SearchQuery;

/// Client for the Twitter search API.
///
/// Terminal calls take `&mut self`: one instance serves one request at a time.
/// Use separate instances for concurrent searches.
///
/// # Example
///
/// ```rust,no_run
/// use tweetsearch::{SearchClient, SearchConfig, SearchQuery};
///
/// #[tokio::main]
/// async fn main() {
///     let mut client = SearchClient::new(SearchConfig::default()).unwrap();
///     let mut query = SearchQuery::new().with("rustlang").lang("en").rpp(20);
///
///     match client.results(&mut query).await {
///         Ok(statuses) => {
///             for status in statuses {
///                 println!("{}", status.text.unwrap_or_default());
///             }
///         }
///         Err(e) => eprintln!("Search failed: {}", e),
///     }
///
///     // The text was cleared but `lang` and `rpp` are still set.
///     assert_eq!(query.text(), "");
/// }
/// ```
#[derive(Debug)]
pub struct SearchClient {
    config: SearchConfig,
    transport: Box<dyn Transport>,
    decoder: Box<dyn ResponseDecoder>,
    last_response: Option<ResponseInfo>,
}

impl SearchClient {
    /// Creates a client sending requests over HTTP with the given configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(SearchClient)`: If the endpoints and headers are valid
    /// - `Err(SearchError::Configuration)`: Otherwise
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(SearchClient::with_transport(config, transport))
    }

    /// Creates a client from `SEARCH_*` environment variables (see [`SearchConfig::from_env`]).
    pub fn from_env() -> Result<Self, SearchError> {
        SearchClient::new(SearchConfig::from_env()?)
    }

    /// Creates a client that sends requests through `transport`.
    pub fn with_transport(config: SearchConfig, transport: impl Transport + 'static) -> Self {
        SearchClient {
            config,
            transport: Box::new(transport),
            decoder: Box::new(FormatDecoder),
            last_response: None,
        }
    }

    /// Replaces the response decoder.
    pub fn with_decoder(mut self, decoder: impl ResponseDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Diagnostics for the most recent request, if it received a response.
    pub fn last_response(&self) -> Option<&ResponseInfo> {
        self.last_response.as_ref()
    }

    /// Runs `query` and returns the matching statuses. The query is left untouched.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Status>)`: The decoded `results`, possibly empty
    /// - `Err(SearchError::Configuration)`: Unsupported format, before any request
    /// - `Err(SearchError::InvalidQuery)`: Out-of-range option, before any request
    /// - `Err(SearchError::Status | Timeout | Network)`: The request failed; nothing is decoded
    /// - `Err(SearchError::Decode)`: The body did not have the expected shape
    pub async fn search(&mut self, query: &SearchQuery) -> Result<Vec<Status>, SearchError> {
        let format = self.config.format()?.ensure_supported()?;
        let url = query.request_url(&self.config.search_endpoint(format))?;

        info!("Searching for '{}'", sanitize_for_logging(&query.text(), 200));
        debug!("Search options: {:?}", query.options());

        let body = self.fetch(&url, "search").await?;
        let statuses = self.decoder.decode_statuses(format, &body)?;

        info!("Search returned {} statuses", statuses.len());
        Ok(statuses)
    }

    /// Runs `query`, then clears its text. Options stay set for the next call.
    ///
    /// Equivalent to `results_with(query, true)`.
    pub async fn results(&mut self, query: &mut SearchQuery) -> Result<Vec<Status>, SearchError> {
        self.results_with(query, true).await
    }

    /// Runs `query`, then clears its text when `reset_query` is true, whatever the outcome.
    ///
    /// Options are never cleared here; call [`SearchQuery::reset`] for a full reset.
    pub async fn results_with(
        &mut self,
        query: &mut SearchQuery,
        reset_query: bool,
    ) -> Result<Vec<Status>, SearchError> {
        let outcome = self.search(query).await;
        if reset_query {
            debug!("Clearing query text, keeping options");
            query.clear_text();
        }
        outcome
    }

    /// Fetches the currently trending topics as a JSON document.
    ///
    /// Ignores every query and option; the trends endpoint always answers in JSON.
    pub async fn trends(&mut self) -> Result<Value, SearchError> {
        let url = self.config.trends_endpoint();
        info!("Fetching trends");

        let body = self.fetch(&url, "trends").await?;
        self.decoder.decode_document(&body)
    }

    /// Sends one GET and returns the body of a `200 OK` response.
    async fn fetch(&mut self, url: &str, operation: &str) -> Result<String, SearchError> {
        debug!("Request URL for '{}': {}", operation, url);

        let response = match self.transport.get(url).await {
            Ok(response) => response,
            Err(e) => {
                self.last_response = None;
                error!("Operation '{}' failed before a response: {}", operation, e);
                return Err(e);
            }
        };

        self.last_response = Some(response.info.clone());
        if !response.is_ok() {
            warn!(
                "Operation '{}' failed - Status: {}",
                operation, response.info.status
            );
            return Err(SearchError::Status {
                status: response.info.status,
                url: url.to_string(),
                info: response.info,
            });
        }

        info!(
            "Operation '{}' completed successfully in {:?}",
            operation, response.info.elapsed
        );
        debug!(
            "Response summary for '{}': {} bytes received",
            operation,
            response.body.len()
        );
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::api::HttpResponse;
    use crate::twitter::parsing::Format;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Replays canned responses and records every requested URL.
    #[derive(Debug, Clone, Default)]
    struct MockTransport {
        responses: Arc<Mutex<Vec<Result<(u16, String), ()>>>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl MockTransport {
        fn replying(status: u16, body: &str) -> Self {
            let mock = MockTransport::default();
            mock.push(status, body);
            mock
        }

        fn push(&self, status: u16, body: &str) {
            self.responses
                .lock()
                .unwrap()
                .push(Ok((status, body.to_string())));
        }

        fn push_timeout(&self) {
            self.responses.lock().unwrap().push(Err(()));
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, SearchError> {
            self.requests.lock().unwrap().push(url.to_string());
            let next = self.responses.lock().unwrap().remove(0);
            match next {
                Ok((status, body)) => Ok(HttpResponse {
                    info: ResponseInfo {
                        url: url.to_string(),
                        status,
                        elapsed: Duration::from_millis(3),
                        content_type: Some("application/json".to_string()),
                        content_length: Some(body.len() as u64),
                    },
                    body,
                }),
                Err(()) => Err(SearchError::Timeout {
                    url: url.to_string(),
                }),
            }
        }
    }

    /// Counts decode calls before delegating to the real decoder.
    #[derive(Debug, Clone, Default)]
    struct SpyDecoder {
        calls: Arc<AtomicUsize>,
    }

    impl ResponseDecoder for SpyDecoder {
        fn decode_statuses(&self, format: Format, body: &str) -> Result<Vec<Status>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            FormatDecoder.decode_statuses(format, body)
        }

        fn decode_document(&self, body: &str) -> Result<Value, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            FormatDecoder.decode_document(body)
        }
    }

    fn client(transport: &MockTransport) -> SearchClient {
        SearchClient::with_transport(SearchConfig::default(), transport.clone())
    }

    #[tokio::test]
    async fn test_results_decodes_json() {
        let transport = MockTransport::replying(200, r#"{"results":[{"text":"hi"}]}"#);
        let mut client = client(&transport);
        let mut query = SearchQuery::new().contains("hi");

        let statuses = client.results(&mut query).await.unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].text.as_deref(), Some("hi"));
        assert_eq!(
            transport.requests(),
            vec!["http://search.twitter.com/search.json?q=hi".to_string()]
        );
        assert_eq!(client.last_response().unwrap().status, 200);
    }

    #[tokio::test]
    async fn test_results_resets_text_but_keeps_options() {
        let transport = MockTransport::replying(200, r#"{"results":[]}"#);
        transport.push(200, r#"{"results":[]}"#);
        let mut client = client(&transport);
        let mut query = SearchQuery::new().from_user("alice").rpp(50).page(2);

        client.results(&mut query).await.unwrap();
        assert_eq!(query.text(), "");
        assert_eq!(query.options().rpp, Some(50));
        assert_eq!(query.options().page, Some(2));

        let mut query = query.with("rust");
        client.results(&mut query).await.unwrap();
        assert_eq!(
            transport.requests()[1],
            "http://search.twitter.com/search.json?q=%23rust&rpp=50&page=2"
        );
    }

    #[tokio::test]
    async fn test_results_with_false_preserves_text() {
        let transport = MockTransport::replying(200, r#"{"results":[]}"#);
        let mut client = client(&transport);
        let mut query = SearchQuery::new().from_user("alice");

        client.results_with(&mut query, false).await.unwrap();
        assert_eq!(query.text(), "from:alice");
    }

    #[tokio::test]
    async fn test_non_200_is_never_decoded() {
        let transport = MockTransport::replying(503, r#"{"results":[{"text":"stale"}]}"#);
        let spy = SpyDecoder::default();
        let mut client = client(&transport).with_decoder(spy.clone());
        let mut query = SearchQuery::new().contains("rust");

        let err = client.results(&mut query).await.unwrap_err();
        assert!(err.is_transport_failure());
        assert_eq!(err.status(), Some(503));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
        assert_eq!(client.last_response().unwrap().status, 503);
        // the text is cleared even though the request failed
        assert_eq!(query.text(), "");
    }

    #[tokio::test]
    async fn test_timeout_clears_last_response() {
        let transport = MockTransport::replying(200, r#"{"results":[]}"#);
        transport.push_timeout();
        let spy = SpyDecoder::default();
        let mut client = client(&transport).with_decoder(spy.clone());

        client.search(&SearchQuery::new()).await.unwrap();
        assert!(client.last_response().is_some());

        let err = client.search(&SearchQuery::new()).await.unwrap_err();
        assert!(matches!(err, SearchError::Timeout { .. }));
        assert!(client.last_response().is_none());
        assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_format_fails_before_request() {
        let transport = MockTransport::default();
        let config = SearchConfig {
            format: "yaml".to_string(),
            ..SearchConfig::default()
        };
        let mut client = SearchClient::with_transport(config, transport.clone());

        let err = client
            .results(&mut SearchQuery::new().contains("rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
        assert!(transport.requests().is_empty());
        assert!(client.last_response().is_none());
    }

    #[tokio::test]
    async fn test_invalid_query_fails_before_request() {
        let transport = MockTransport::default();
        let mut client = client(&transport);

        let err = client.search(&SearchQuery::new().rpp(500)).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_is_distinguishable() {
        let transport = MockTransport::replying(200, r#"{"error":"nope"}"#);
        let mut client = client(&transport);

        let err = client.search(&SearchQuery::new()).await.unwrap_err();
        assert!(matches!(err, SearchError::Decode { .. }));
        assert!(!err.is_transport_failure());
    }

    #[tokio::test]
    async fn test_trends_ignores_query_state() {
        let body = r##"{"trends":[{"name":"#rust"},{"name":"tokio"}]}"##;
        let transport = MockTransport::replying(200, body);
        let config = SearchConfig {
            format: "xml".to_string(),
            ..SearchConfig::default()
        };
        let mut client = SearchClient::with_transport(config, transport.clone());

        let trends = client.trends().await.unwrap();
        assert_eq!(trends["trends"][1]["name"], "tokio");
        assert_eq!(
            transport.requests(),
            vec!["http://search.twitter.com/trends.json".to_string()]
        );
    }
}
