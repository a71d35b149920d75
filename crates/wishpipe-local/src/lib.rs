use futures_util::StreamExt;
use std::time::Duration;
use wishpipe_core::{Error, HeaderSet, MetadataFetcher, PageFetcher, PageMetadata, Result};

pub mod auth;
pub mod harvest;

const DEFAULT_MAX_BYTES: usize = 5_000_000;

/// Reqwest-backed implementation of both fetch capabilities.
///
/// One client serves the structured fetch and the raw-HTML fallback fetch;
/// both apply the caller's header set and per-request timeout and follow up
/// to 10 redirects.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            // Safety default: never hang on DNS/TLS stalls. The per-request
            // timeout still bounds the whole transfer.
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Upstream(e.to_string()))?;
        Ok(Self {
            client,
            max_bytes: DEFAULT_MAX_BYTES,
        })
    }

    /// Hard cap on bytes read from an upstream body.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes.max(1);
        self
    }

    fn apply_headers(
        mut rb: reqwest::RequestBuilder,
        headers: &HeaderSet,
    ) -> reqwest::RequestBuilder {
        for (k, v) in headers {
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::from_bytes(k.as_bytes()),
                reqwest::header::HeaderValue::from_str(v),
            ) {
                rb = rb.header(name, value);
            }
        }
        rb
    }

    async fn get_text(&self, url: &str, headers: &HeaderSet, timeout: Duration) -> Result<String> {
        let rb = Self::apply_headers(self.client.get(url), headers).timeout(timeout);
        let resp = rb.send().await.map_err(classify_transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::UpstreamBlocked);
        }
        if !status.is_success() {
            return Err(Error::Upstream(format!("origin returned HTTP {status}")));
        }

        let bytes = self.read_capped(resp).await?;
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }

    async fn read_capped(&self, resp: reqwest::Response) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify_transport)?;
            if out.len() + chunk.len() >= self.max_bytes {
                let take = self.max_bytes - out.len();
                out.extend_from_slice(&chunk[..take]);
                tracing::debug!(max_bytes = self.max_bytes, "response body truncated");
                break;
            }
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}

fn classify_transport(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::UpstreamTimeout
    } else {
        Error::Upstream(err.to_string())
    }
}

#[async_trait::async_trait]
impl MetadataFetcher for HttpFetcher {
    async fn fetch_page_metadata(
        &self,
        url: &str,
        headers: &HeaderSet,
        timeout: Duration,
    ) -> Result<PageMetadata> {
        let body = self.get_text(url, headers, timeout).await?;
        Ok(harvest::harvest_page(&body))
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_raw(&self, url: &str, headers: &HeaderSet, timeout: Duration) -> Result<String> {
        self.get_text(url, headers, timeout).await
    }
}
