//! SSRF guard for caller-supplied URLs.
//!
//! This is a denylist, not an allowlist: it blocks the obvious loopback and
//! RFC 1918 targets plus anything that self-identifies as internal, and
//! accepts everything else. Known gaps, kept as documented behavior rather
//! than silently closed (closing them changes which inputs are accepted):
//! - `172.17.` through `172.31.` are not covered by the `172.16.` prefix
//! - IPv6 private/link-local ranges beyond `::1`
//! - DNS rebinding and hostile redirects after the check

/// Pure predicate: is `raw` an acceptable fetch target?
///
/// - false on parse failure or any scheme other than http/https
/// - false for loopback/unspecified hosts and the denylisted private prefixes
/// - false for any host containing the substring `internal`
pub fn is_safe_url(raw: &str) -> bool {
    let parsed = match url::Url::parse(raw) {
        Ok(u) => u,
        Err(_) => return false,
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let host = match parsed.host_str() {
        Some(h) => h,
        None => return false,
    };
    // IPv6 hosts carry brackets in the URL form; compare the bare address.
    let host = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_ascii_lowercase();
    if matches!(host.as_str(), "localhost" | "127.0.0.1" | "::1" | "0.0.0.0") {
        return false;
    }
    if host.starts_with("192.168.") || host.starts_with("10.") || host.starts_with("172.16.") {
        return false;
    }
    if host.contains("internal") {
        return false;
    }
    true
}
