//! Media fetch over HTTP.
//!
//! [`HttpFetcher`] resolves a locator against a media gateway and stages
//! the returned bytes in a scratch directory.

pub mod http;

pub use http::HttpFetcher;
