//! Field resolution cascades.
//!
//! Every field follows a strict priority order: the first source that yields
//! a non-empty value wins and later sources are never consulted for that
//! field. Resolvers return `Option`, so "not found" stays explicit; the
//! empty-string sentinel only exists in the assembled wire record.

use crate::jsonld::JsonLdNode;
use crate::RawTagMap;
use regex::Regex;
use std::sync::LazyLock;

// Strict symbol form first ("$1,299.99"), bare currency code second
// ("USD 25.50"). The capture tolerates either separator style; commas are
// stripped from the capture before acceptance.
static SYMBOL_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$€£¥]\s*(\d{1,3}(?:[.,]\d{3})*(?:[.,]\d{2})?)").expect("hardcoded pattern")
});
static CODE_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:USD|EUR|GBP)\s*(\d{1,3}(?:[.,]\d{3})*(?:[.,]\d{2})?)")
        .expect("hardcoded pattern")
});

/// Where the resolved price came from. Currency resolution needs to know,
/// because an offer's `priceCurrency` only applies when the price itself
/// came from that offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSource {
    JsonLd { currency: Option<String> },
    Tags,
    Text,
    None,
}

fn tag(tags: &RawTagMap, key: &str) -> Option<String> {
    tags.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn products(nodes: &[JsonLdNode]) -> impl Iterator<Item = &JsonLdNode> {
    nodes.iter().filter(|n| n.is_product())
}

/// `og:title` -> `twitter:title` -> `title` -> JSON-LD `Product.name`.
pub fn resolve_title(tags: &RawTagMap, nodes: &[JsonLdNode]) -> Option<String> {
    tag(tags, "og:title")
        .or_else(|| tag(tags, "twitter:title"))
        .or_else(|| tag(tags, "title"))
        .or_else(|| products(nodes).find_map(|p| p.name.as_deref().and_then(non_empty)))
}

/// `og:description` -> `twitter:description` -> `description` -> JSON-LD
/// `Product.description`.
pub fn resolve_description(tags: &RawTagMap, nodes: &[JsonLdNode]) -> Option<String> {
    tag(tags, "og:description")
        .or_else(|| tag(tags, "twitter:description"))
        .or_else(|| tag(tags, "description"))
        .or_else(|| products(nodes).find_map(|p| p.description.as_deref().and_then(non_empty)))
}

/// `og:image` -> `twitter:image` -> `image` -> JSON-LD `Product.image`.
/// An empty result defers to the raw-HTML fallback scanner.
pub fn resolve_image(tags: &RawTagMap, nodes: &[JsonLdNode]) -> Option<String> {
    tag(tags, "og:image")
        .or_else(|| tag(tags, "twitter:image"))
        .or_else(|| tag(tags, "image"))
        .or_else(|| products(nodes).find_map(|p| p.image.as_ref().and_then(|i| i.first_url())))
}

/// Strip everything but digits and dots; accept only if the remainder parses
/// as a finite float. Shared normalization for every price source, so
/// "$1,299.00" and "49.99" both come out as plain digits-and-dot.
pub fn sanitize_price(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(cleaned),
        _ => None,
    }
}

// Flat price tags, in priority order.
const PRICE_TAG_KEYS: [&str; 5] = [
    "og:price:amount",
    "product:price:amount",
    "price",
    "product:price",
    "twitter:data1",
];

/// The price cascade: JSON-LD offers, then flat tags, then a regex pass over
/// the resolved description and title (description first). Fields can be
/// sourced from different Product nodes: each node is tried in flattened
/// order until one yields a usable value.
pub fn resolve_price(
    tags: &RawTagMap,
    nodes: &[JsonLdNode],
    description: &str,
    title: &str,
) -> (Option<String>, PriceSource) {
    // 1. JSON-LD offers: first offer of the first Product node that yields a
    //    parseable price/lowPrice/highPrice.
    for product in products(nodes) {
        let Some(offer) = product.offers.as_ref().and_then(|o| o.first()) else {
            continue;
        };
        let candidates = [&offer.price, &offer.low_price, &offer.high_price];
        for value in candidates.into_iter().flatten() {
            if let Some(price) = sanitize_price(&value.to_text()) {
                let currency = offer
                    .price_currency
                    .as_deref()
                    .and_then(non_empty);
                return (Some(price), PriceSource::JsonLd { currency });
            }
        }
    }

    // 2. Flat tags.
    for key in PRICE_TAG_KEYS {
        if let Some(price) = tag(tags, key).as_deref().and_then(sanitize_price) {
            return (Some(price), PriceSource::Tags);
        }
    }

    // 3. Regex over prose, description before title.
    for text in [description, title] {
        if let Some(price) = price_from_text(text) {
            return (Some(price), PriceSource::Text);
        }
    }

    (None, PriceSource::None)
}

fn price_from_text(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let captured = SYMBOL_PRICE
        .captures(text)
        .or_else(|| CODE_PRICE.captures(text))?;
    Some(captured[1].replace(',', ""))
}

/// Currency is resolved independently of whether the price cascade
/// succeeded: offer `priceCurrency` when the price came from JSON-LD, then
/// the flat currency tags, then the `"USD"` default.
pub fn resolve_currency(tags: &RawTagMap, source: &PriceSource) -> String {
    if let PriceSource::JsonLd { currency: Some(c) } = source {
        return c.to_ascii_uppercase();
    }
    tag(tags, "og:price:currency")
        .or_else(|| tag(tags, "product:price:currency"))
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or_else(|| "USD".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonld::normalize_product_nodes;

    fn tags(pairs: &[(&str, &str)]) -> RawTagMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn nodes(js: &str) -> Vec<JsonLdNode> {
        let raw: Vec<JsonLdNode> = serde_json::from_str(js).expect("fixture nodes parse");
        normalize_product_nodes(raw)
    }

    #[test]
    fn title_priority_og_wins() {
        let t = tags(&[("og:title", "A"), ("title", "B")]);
        assert_eq!(resolve_title(&t, &[]), Some("A".to_string()));
    }

    #[test]
    fn title_falls_through_to_jsonld_name() {
        let n = nodes(r#"[{"@type": "Product", "name": "Widget Pro"}]"#);
        assert_eq!(resolve_title(&tags(&[]), &n), Some("Widget Pro".to_string()));
    }

    #[test]
    fn blank_tags_do_not_win() {
        let t = tags(&[("og:title", "   "), ("twitter:title", "T")]);
        assert_eq!(resolve_title(&t, &[]), Some("T".to_string()));
    }

    #[test]
    fn jsonld_offer_beats_flat_price_tag() {
        let t = tags(&[("price", "99.00")]);
        let n = nodes(r#"[{"@type": "Product", "offers": {"price": "49.99"}}]"#);
        let (price, source) = resolve_price(&t, &n, "", "");
        assert_eq!(price, Some("49.99".to_string()));
        assert_eq!(source, PriceSource::JsonLd { currency: None });
    }

    #[test]
    fn aggregate_offer_prefers_low_price() {
        let n = nodes(
            r#"[{"@type": "Product", "offers": {"lowPrice": "10.00", "highPrice": "20.00"}}]"#,
        );
        let (price, _) = resolve_price(&tags(&[]), &n, "", "");
        assert_eq!(price, Some("10.00".to_string()));
    }

    #[test]
    fn flat_tags_tried_in_order() {
        let t = tags(&[("product:price:amount", "12.00"), ("price", "34.00")]);
        let (price, source) = resolve_price(&t, &[], "", "");
        assert_eq!(price, Some("12.00".to_string()));
        assert_eq!(source, PriceSource::Tags);
    }

    #[test]
    fn unparseable_tag_values_are_skipped() {
        let t = tags(&[("og:price:amount", "call us"), ("price", "$15.00")]);
        let (price, _) = resolve_price(&t, &[], "", "");
        assert_eq!(price, Some("15.00".to_string()));
    }

    #[test]
    fn symbol_regex_over_description() {
        let (price, source) = resolve_price(&tags(&[]), &[], "Now only $19.99!", "");
        assert_eq!(price, Some("19.99".to_string()));
        assert_eq!(source, PriceSource::Text);
    }

    #[test]
    fn code_regex_when_no_symbol_matches() {
        let (price, _) = resolve_price(&tags(&[]), &[], "USD 25.50 today", "");
        assert_eq!(price, Some("25.50".to_string()));
    }

    #[test]
    fn description_checked_before_title() {
        let (price, _) = resolve_price(&tags(&[]), &[], "sale $5.00", "was $9.00");
        assert_eq!(price, Some("5.00".to_string()));
    }

    #[test]
    fn thousands_commas_stripped_from_capture() {
        let (price, _) = resolve_price(&tags(&[]), &[], "only $1,299.99 while stocks last", "");
        assert_eq!(price, Some("1299.99".to_string()));
    }

    #[test]
    fn fields_can_come_from_different_product_nodes() {
        // First Product has a name but no offers; second carries the price.
        let n = nodes(
            r#"[
                {"@type": "Product", "name": "Widget"},
                {"@type": "Product", "offers": {"price": 7.5, "priceCurrency": "gbp"}}
            ]"#,
        );
        assert_eq!(resolve_title(&tags(&[]), &n), Some("Widget".to_string()));
        let (price, source) = resolve_price(&tags(&[]), &n, "", "");
        assert_eq!(price, Some("7.5".to_string()));
        assert_eq!(resolve_currency(&tags(&[]), &source), "GBP");
    }

    #[test]
    fn currency_defaults_to_usd_even_when_price_found_in_text() {
        let (price, source) = resolve_price(&tags(&[]), &[], "just $3.00", "");
        assert!(price.is_some());
        assert_eq!(resolve_currency(&tags(&[]), &source), "USD");
    }

    #[test]
    fn currency_from_flat_tags_is_uppercased() {
        let t = tags(&[("og:price:currency", "eur")]);
        assert_eq!(resolve_currency(&t, &PriceSource::Tags), "EUR");
    }

    #[test]
    fn offer_currency_only_applies_to_jsonld_prices() {
        // Price came from flat tags; a stray offer currency must not leak in.
        let t = tags(&[("product:price:currency", "CAD")]);
        assert_eq!(resolve_currency(&t, &PriceSource::Tags), "CAD");
    }

    #[test]
    fn graph_wrapped_product_resolves_like_top_level() {
        let wrapped = nodes(
            r#"[{"@graph": [{"@type": "Product", "name": "Graphed", "offers": {"price": "2.50"}}]}]"#,
        );
        let top = nodes(r#"[{"@type": "Product", "name": "Graphed", "offers": {"price": "2.50"}}]"#);
        assert_eq!(resolve_title(&tags(&[]), &wrapped), resolve_title(&tags(&[]), &top));
        assert_eq!(
            resolve_price(&tags(&[]), &wrapped, "", "").0,
            resolve_price(&tags(&[]), &top, "", "").0
        );
    }

    #[test]
    fn sanitize_price_strips_to_digits_and_dot() {
        assert_eq!(sanitize_price("$1,299.00"), Some("1299.00".to_string()));
        assert_eq!(sanitize_price("49.99"), Some("49.99".to_string()));
        assert_eq!(sanitize_price("free"), None);
        assert_eq!(sanitize_price("1.2.3"), None);
        assert_eq!(sanitize_price(""), None);
    }
}
