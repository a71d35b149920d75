use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod guard;
pub mod headers;
pub mod jsonld;
pub mod pipeline;
pub mod resolve;
pub mod scan;
pub mod sites;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("forbidden target: {0}")]
    ForbiddenTarget(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("upstream blocked automated access")]
    UpstreamBlocked,
    #[error("upstream timed out")]
    UpstreamTimeout,
    #[error("upstream failed: {0}")]
    Upstream(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Request headers for an upstream fetch.
///
/// An explicit value threaded through calls; both fetches of a request reuse
/// the same selected set.
pub type HeaderSet = BTreeMap<String, String>;

/// Flat tag map from the structured fetch (`og:title`, `twitter:image`,
/// `product:price:amount`, ...). Keys are unique and case-sensitive.
pub type RawTagMap = BTreeMap<String, String>;

/// A single extraction request. The URL must pass [`guard::is_safe_url`]
/// before any network access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub url: String,
}

/// Structured metadata for one page: flat tags plus parsed JSON-LD nodes.
#[derive(Debug, Clone, Default)]
pub struct PageMetadata {
    pub tags: RawTagMap,
    pub json_ld: Vec<jsonld::JsonLdNode>,
}

/// The normalized product record.
///
/// Empty string is the "unknown" sentinel for `title`/`description`/`image`/
/// `price`; `currency` defaults to `"USD"`. A non-empty `price` is plain
/// digits with an optional fractional part (thousands separators stripped).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: String,
    pub description: String,
    pub image: String,
    pub price: String,
    pub currency: String,
    pub url: String,
}

/// Structured-metadata fetch capability.
///
/// Implementations must enforce `timeout`, follow redirects, and classify
/// failures: origin 403 -> [`Error::UpstreamBlocked`], elapsed budget ->
/// [`Error::UpstreamTimeout`], anything else -> [`Error::Upstream`].
#[async_trait::async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch_page_metadata(
        &self,
        url: &str,
        headers: &HeaderSet,
        timeout: Duration,
    ) -> Result<PageMetadata>;
}

/// Raw page fetch capability, used only by the fallback scanner.
///
/// The structured fetch does not expose the response body, so an incomplete
/// record costs one extra request.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_raw(&self, url: &str, headers: &HeaderSet, timeout: Duration) -> Result<String>;
}

/// Bearer-token validation against the deployment's identity provider.
/// Returns the subject (user id) for a valid token.
#[async_trait::async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<String>;
}
