//! The extraction pipeline, leaf to root.
//!
//! Strictly sequential with early exit per field: a field resolved from a
//! higher-priority source is never overwritten by a lower one. At most two
//! network calls per request: the structured fetch, and one raw-HTML
//! re-fetch when price or image is still missing afterwards. The pipeline
//! holds no state across requests.

use crate::{
    guard, headers, jsonld, resolve, scan, Error, ExtractionRequest, ExtractionResult,
    MetadataFetcher, PageFetcher, Result,
};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Budget for each upstream fetch (structured and raw).
    pub timeout: Duration,
    /// Skip the SSRF guard. Only for tests and private dev fixtures.
    pub allow_unsafe_targets: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            allow_unsafe_targets: false,
        }
    }
}

/// Run the full cascade for one request.
///
/// Errors out of the structured fetch are surfaced to the caller already
/// classified; a failed raw-HTML fallback fetch degrades to empty fields
/// instead.
pub async fn extract(
    req: &ExtractionRequest,
    fetcher: &dyn MetadataFetcher,
    pages: &dyn PageFetcher,
    opts: &ExtractOptions,
) -> Result<ExtractionResult> {
    let url = req.url.trim();
    if url.is_empty() {
        return Err(Error::InvalidInput("url must not be empty".to_string()));
    }
    if !opts.allow_unsafe_targets && !guard::is_safe_url(url) {
        return Err(Error::ForbiddenTarget(url.to_string()));
    }

    let headers = headers::select_headers(url);
    let page = fetcher.fetch_page_metadata(url, &headers, opts.timeout).await?;
    let nodes = jsonld::normalize_product_nodes(page.json_ld);

    let title = resolve::resolve_title(&page.tags, &nodes);
    let description = resolve::resolve_description(&page.tags, &nodes);
    let mut image = resolve::resolve_image(&page.tags, &nodes);
    let (mut price, source) = resolve::resolve_price(
        &page.tags,
        &nodes,
        description.as_deref().unwrap_or(""),
        title.as_deref().unwrap_or(""),
    );
    let currency = resolve::resolve_currency(&page.tags, &source);

    if price.is_none() || image.is_none() {
        // Second fetch, same headers. Failure leaves the fields empty; it
        // must never fail the request.
        match pages.fetch_raw(url, &headers, opts.timeout).await {
            Ok(html) => {
                let scanned = scan::scan_raw_html(&html, url);
                if price.is_none() {
                    price = scanned.price;
                }
                if image.is_none() {
                    image = scanned.image;
                }
            }
            Err(err) => {
                tracing::debug!(url, error = %err, "raw-html fallback fetch failed");
            }
        }
    }

    Ok(assemble(url, title, description, image, price, currency))
}

/// Final shaping: trim everything, upgrade the image scheme, fill the
/// sentinels. Never fails.
fn assemble(
    url: &str,
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
    price: Option<String>,
    currency: String,
) -> ExtractionResult {
    ExtractionResult {
        title: title.unwrap_or_default().trim().to_string(),
        description: description.unwrap_or_default().trim().to_string(),
        image: upgrade_image_scheme(image.unwrap_or_default().trim()),
        price: price.unwrap_or_default().trim().to_string(),
        currency: currency.trim().to_string(),
        url: url.to_string(),
    }
}

// Only a literal `http:` prefix is rewritten; protocol-relative `//host/img`
// URLs pass through untouched.
fn upgrade_image_scheme(image: &str) -> String {
    match image.strip_prefix("http:") {
        Some(rest) => format!("https:{rest}"),
        None => image.to_string(),
    }
}
