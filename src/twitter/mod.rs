//! Twitter search API integration module.
//!
//! This module contains query construction, the HTTP transport, response
//! decoding and the client tying them together.

mod api;
mod parsing;
mod query;
mod search;

// Re-export public API
pub use api::{HttpResponse, HttpTransport, ResponseInfo, Transport};
pub use parsing::{Format, FormatDecoder, ResponseDecoder, Status};
pub use query::{
    DistanceUnit, Geocode, ResultType, SearchOptions, SearchQuery, Token, MAX_RESULTS_PER_PAGE,
};
pub use search::SearchClient;
