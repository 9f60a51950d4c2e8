//! Search query construction.
//!
//! A [`SearchQuery`] is built by chaining calls that each append one token to the
//! query text (`from:alice`, `@bob`, `#rust`, a plain word) or set one request
//! option (page size, language, geocode...). The finished value is serialized into
//! the request URL by [`SearchQuery::request_url`].

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// Largest page size the API accepts.
pub const MAX_RESULTS_PER_PAGE: u32 = 100;

/// One fragment of the query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Raw text the query was seeded with
    Raw(String),
    /// `from:<user>`
    From(String),
    /// `to:<user>`
    To(String),
    /// `@<user>`
    Mention(String),
    /// `#<tag>`
    Hashtag(String),
    /// A word appended verbatim
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Raw(text) | Token::Word(text) => f.write_str(text),
            Token::From(user) => write!(f, "from:{}", user),
            Token::To(user) => write!(f, "to:{}", user),
            Token::Mention(user) => write!(f, "@{}", user),
            Token::Hashtag(tag) => write!(f, "#{}", tag),
        }
    }
}

/// Which results the API should favour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Mixed,
    Popular,
    Recent,
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResultType::Mixed => "mixed",
            ResultType::Popular => "popular",
            ResultType::Recent => "recent",
        })
    }
}

impl FromStr for ResultType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mixed" => Ok(ResultType::Mixed),
            "popular" => Ok(ResultType::Popular),
            "recent" => Ok(ResultType::Recent),
            other => Err(SearchError::InvalidQuery(format!(
                "unknown result type '{}' (expected mixed, popular or recent)",
                other
            ))),
        }
    }
}

/// Unit for a geocode radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            DistanceUnit::Miles => "mi",
            DistanceUnit::Kilometers => "km",
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mi" => Ok(DistanceUnit::Miles),
            "km" => Ok(DistanceUnit::Kilometers),
            other => Err(SearchError::InvalidQuery(format!(
                "unknown distance unit '{}' (expected mi or km)",
                other
            ))),
        }
    }
}

/// Area filter: statuses from users located within `radius` of a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geocode {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub unit: DistanceUnit,
}

impl Geocode {
    fn validate(&self) -> Result<(), SearchError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SearchError::InvalidQuery(format!(
                "geocode latitude {} is outside -90..=90",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SearchError::InvalidQuery(format!(
                "geocode longitude {} is outside -180..=180",
                self.longitude
            )));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(SearchError::InvalidQuery(format!(
                "geocode radius must be positive, got {}",
                self.radius
            )));
        }
        Ok(())
    }
}

/// Formats as the API expects it: `lat,long,radius` immediately followed by the unit.
impl fmt::Display for Geocode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}{}",
            self.latitude,
            self.longitude,
            self.radius,
            self.unit.suffix()
        )
    }
}

/// Per-request options. Every field is absent unless explicitly set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    /// Results per page, 1..=100
    pub rpp: Option<u32>,
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// ISO 639-1 language code
    pub lang: Option<String>,
    /// Locale of the query
    pub locale: Option<String>,
    /// Only statuses with an id greater than this
    pub since_id: Option<u64>,
    /// Only statuses with an id at most this
    pub max_id: Option<u64>,
    /// Prefix each status with `<user>:`
    pub show_user: bool,
    pub geocode: Option<Geocode>,
    pub result_type: Option<ResultType>,
    /// Return entity metadata (urls, mentions, hashtags) with each status
    pub include_entities: bool,
}

impl SearchOptions {
    fn validate(&self) -> Result<(), SearchError> {
        if let Some(rpp) = self.rpp {
            if !(1..=MAX_RESULTS_PER_PAGE).contains(&rpp) {
                return Err(SearchError::InvalidQuery(format!(
                    "results per page must be between 1 and {}, got {}",
                    MAX_RESULTS_PER_PAGE, rpp
                )));
            }
        }
        if self.page == Some(0) {
            return Err(SearchError::InvalidQuery("page numbers start at 1".to_string()));
        }
        if matches!(&self.lang, Some(lang) if lang.trim().is_empty()) {
            return Err(SearchError::InvalidQuery("language code is empty".to_string()));
        }
        if matches!(&self.locale, Some(locale) if locale.trim().is_empty()) {
            return Err(SearchError::InvalidQuery("locale is empty".to_string()));
        }
        if let Some(geocode) = &self.geocode {
            geocode.validate()?;
        }
        Ok(())
    }
}

/// Wire form of a query. Field order fixes the parameter order in the URL.
#[derive(Serialize)]
struct QueryParams<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rpp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lang: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    show_user: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    geocode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_type: Option<ResultType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_entities: Option<bool>,
}

/// A search query: ordered text tokens plus request options.
///
/// Builder methods take `self` by value and return the updated query, so each
/// step produces a new value instead of mutating one shared by several callers.
///
/// # Example
///
/// ```rust
/// use tweetsearch::{ResultType, SearchQuery};
///
/// let query = SearchQuery::new()
///     .from_user("@alice")
///     .with("rustlang")
///     .contains("async")
///     .result_type(ResultType::Recent)
///     .rpp(50);
///
/// assert_eq!(query.text(), "from:alice #rustlang async");
/// assert_eq!(query.options().rpp, Some(50));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    tokens: Vec<Token>,
    options: SearchOptions,
}

impl SearchQuery {
    /// An empty query with no options set.
    pub fn new() -> Self {
        SearchQuery::default()
    }

    /// A query starting from raw search text, e.g. `"rust OR golang"`.
    pub fn seeded(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut query = SearchQuery::default();
        if !raw.trim().is_empty() {
            query.tokens.push(Token::Raw(raw));
        }
        query
    }

    fn push(mut self, token: Token) -> Self {
        self.tokens.push(token);
        self
    }

    /// Statuses sent by `user`. Surrounding whitespace and a leading `@` are ignored.
    pub fn from_user(self, user: &str) -> Self {
        self.push(Token::From(strip_prefix(user, '@')))
    }

    /// Statuses addressed to `user`. Surrounding whitespace and a leading `@` are ignored.
    pub fn to_user(self, user: &str) -> Self {
        self.push(Token::To(strip_prefix(user, '@')))
    }

    /// Statuses mentioning `user`. Surrounding whitespace and a leading `@` are ignored.
    pub fn about(self, user: &str) -> Self {
        self.push(Token::Mention(strip_prefix(user, '@')))
    }

    /// Statuses carrying the hashtag `tag`. Surrounding whitespace and a leading `#` are ignored.
    pub fn with(self, tag: &str) -> Self {
        self.push(Token::Hashtag(strip_prefix(tag, '#')))
    }

    /// Statuses containing `word`, appended verbatim.
    pub fn contains(self, word: &str) -> Self {
        self.push(Token::Word(word.to_string()))
    }

    pub fn include_entities(mut self) -> Self {
        self.options.include_entities = true;
        self
    }

    pub fn result_type(mut self, result_type: ResultType) -> Self {
        self.options.result_type = Some(result_type);
        self
    }

    pub fn show_user(mut self) -> Self {
        self.options.show_user = true;
        self
    }

    /// Only statuses with an id greater than `id`. Zero is a valid id.
    pub fn since(mut self, id: u64) -> Self {
        self.options.since_id = Some(id);
        self
    }

    /// Only statuses with an id at most `id`.
    pub fn max(mut self, id: u64) -> Self {
        self.options.max_id = Some(id);
        self
    }

    /// Restrict to an ISO 639-1 language (`en`, `de`...).
    pub fn lang(mut self, code: &str) -> Self {
        self.options.lang = Some(code.to_string());
        self
    }

    pub fn locale(mut self, code: &str) -> Self {
        self.options.locale = Some(code.to_string());
        self
    }

    /// Results per page. Checked against 1..=100 when the request is built.
    pub fn rpp(mut self, n: u32) -> Self {
        self.options.rpp = Some(n);
        self
    }

    pub fn page(mut self, n: u32) -> Self {
        self.options.page = Some(n);
        self
    }

    /// Restrict to statuses within `radius` miles of a point.
    pub fn geocode(self, latitude: f64, longitude: f64, radius: f64) -> Self {
        self.geocode_in(latitude, longitude, radius, DistanceUnit::Miles)
    }

    /// Restrict to statuses within `radius` of a point, in the given unit.
    pub fn geocode_in(
        mut self,
        latitude: f64,
        longitude: f64,
        radius: f64,
        unit: DistanceUnit,
    ) -> Self {
        self.options.geocode = Some(Geocode {
            latitude,
            longitude,
            radius,
            unit,
        });
        self
    }

    /// Replaces all options at once.
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// The query text: tokens in call order, separated by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(Token::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Drops the query text but keeps every option.
    pub fn clear_text(&mut self) {
        self.tokens.clear();
    }

    /// Drops the query text and every option.
    pub fn reset(&mut self) {
        *self = SearchQuery::default();
    }

    /// Checks tokens and options before a request is built.
    pub fn validate(&self) -> Result<(), SearchError> {
        for token in &self.tokens {
            match token {
                Token::From(name) | Token::To(name) | Token::Mention(name) if name.is_empty() => {
                    return Err(SearchError::InvalidQuery(format!(
                        "'{}' needs a user name",
                        token
                    )));
                }
                Token::Hashtag(tag) if tag.is_empty() => {
                    return Err(SearchError::InvalidQuery("'#' needs a hashtag".to_string()));
                }
                _ => {}
            }
        }
        self.options.validate()
    }

    /// Form-encoded parameters: `q` first, then each set option in a fixed order.
    pub fn to_params(&self) -> Result<String, SearchError> {
        self.validate()?;

        let text = self.text();
        let options = &self.options;
        let params = QueryParams {
            q: &text,
            rpp: options.rpp,
            page: options.page,
            lang: options.lang.as_deref(),
            locale: options.locale.as_deref(),
            since_id: options.since_id,
            max_id: options.max_id,
            show_user: options.show_user.then_some(true),
            geocode: options.geocode.map(|g| g.to_string()),
            result_type: options.result_type,
            include_entities: options.include_entities.then_some(true),
        };

        serde_urlencoded::to_string(&params).map_err(|e| {
            SearchError::InvalidQuery(format!("could not encode query parameters: {}", e))
        })
    }

    /// Full request URL for `endpoint` (which already carries the format extension).
    pub fn request_url(&self, endpoint: &str) -> Result<String, SearchError> {
        Ok(format!("{}?{}", endpoint, self.to_params()?))
    }
}

/// Trims whitespace, then every leading `prefix` character.
fn strip_prefix(input: &str, prefix: char) -> String {
    input.trim().trim_start_matches(prefix).to_string()
}
