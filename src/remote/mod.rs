//! Remote poetry API access.
//!
//! - [`client`] - HTTP client with per-endpoint timeouts and size limits
//! - [`decode`] - tolerant decoding of the API's inconsistent response shapes
//! - [`strategies`] - independent best-effort acquisition tactics
//!
//! Nothing in this module panics or propagates errors past a strategy: a
//! failed request simply contributes no poems.

mod client;
pub mod decode;
mod strategies;

pub use client::{ApiClient, FetchError};
pub use strategies::{
    FetchStrategy, IdProbe, KeywordSearch, PoetProbe, KNOWN_POET_IDS, SEARCH_TERMS,
};
