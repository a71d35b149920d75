//! Request header selection.

use crate::{sites, HeaderSet};

const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Browser-like defaults. Some retailers serve stripped-down markup (or a
/// block page) to anything that does not look like a navigating browser.
pub fn default_headers() -> HeaderSet {
    let mut h = HeaderSet::new();
    h.insert("User-Agent".to_string(), DEFAULT_UA.to_string());
    h.insert(
        "Accept".to_string(),
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
            .to_string(),
    );
    h.insert("Accept-Language".to_string(), "en-US,en;q=0.9".to_string());
    h.insert("Sec-Fetch-Dest".to_string(), "document".to_string());
    h.insert("Sec-Fetch-Mode".to_string(), "navigate".to_string());
    h.insert("Sec-Fetch-Site".to_string(), "none".to_string());
    h.insert("Upgrade-Insecure-Requests".to_string(), "1".to_string());
    h
}

/// Header set for `url`, with any per-site User-Agent override applied.
pub fn select_headers(url: &str) -> HeaderSet {
    let mut headers = default_headers();
    let host = sites::host_of(url);
    if let Some(profile) = sites::profile_for_host(&host) {
        if let Some(ua) = profile.user_agent {
            headers.insert("User-Agent".to_string(), ua.to_string());
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::FACEBOOK_CRAWLER_UA;

    #[test]
    fn default_set_is_browser_like() {
        let h = select_headers("https://example.com/item");
        assert_eq!(h.get("User-Agent").map(String::as_str), Some(DEFAULT_UA));
        assert_eq!(h.get("Upgrade-Insecure-Requests").map(String::as_str), Some("1"));
        assert!(h.contains_key("Sec-Fetch-Mode"));
    }

    #[test]
    fn shein_gets_the_crawler_identity() {
        let h = select_headers("https://www.shein.com/item-p-123.html");
        assert_eq!(h.get("User-Agent").map(String::as_str), Some(FACEBOOK_CRAWLER_UA));
        // Only the UA is swapped; the rest of the set stays.
        assert!(h.contains_key("Accept-Language"));
    }
}
