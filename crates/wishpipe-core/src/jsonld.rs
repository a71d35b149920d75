//! JSON-LD product node model and `@graph` normalization.
//!
//! The model is deliberately loose: real-world JSON-LD mixes strings,
//! arrays, and objects freely for the same key, and prices show up both as
//! strings and as bare numbers. Untagged enums absorb the variation; a node
//! that still fails to deserialize is skipped by the harvester rather than
//! failing the page.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonLdNode {
    #[serde(rename = "@type", default)]
    pub node_type: Option<TypeField>,
    #[serde(rename = "@graph", default)]
    pub graph: Option<Vec<JsonLdNode>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<ImageField>,
    #[serde(default)]
    pub offers: Option<OfferField>,
}

impl JsonLdNode {
    /// Only a single-string `@type` of exactly `Product` or
    /// `http://schema.org/Product` marks a Product node. Array-typed nodes
    /// do not qualify.
    pub fn is_product(&self) -> bool {
        matches!(
            self.node_type.as_ref().and_then(TypeField::as_single),
            Some("Product") | Some("http://schema.org/Product")
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeField {
    One(String),
    Many(Vec<String>),
    Other(serde_json::Value),
}

impl TypeField {
    fn as_single(&self) -> Option<&str> {
        match self {
            TypeField::One(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// `image` as it appears in the wild: a URL string, a list, or an
/// ImageObject with a `url` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageField {
    Url(String),
    Many(Vec<ImageField>),
    Object { url: Option<String> },
    Other(serde_json::Value),
}

impl ImageField {
    /// The usable URL: first element of a list, `url` of an object, the
    /// string itself otherwise.
    pub fn first_url(&self) -> Option<String> {
        match self {
            ImageField::Url(s) => non_empty(s),
            ImageField::Many(list) => list.first().and_then(ImageField::first_url),
            ImageField::Object { url } => url.as_deref().and_then(non_empty),
            ImageField::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OfferField {
    Many(Vec<Offer>),
    One(Offer),
    Other(serde_json::Value),
}

impl OfferField {
    /// Only the first offer of a list is ever consulted.
    pub fn first(&self) -> Option<&Offer> {
        match self {
            OfferField::One(o) => Some(o),
            OfferField::Many(v) => v.first(),
            OfferField::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Offer {
    #[serde(default)]
    pub price: Option<ScalarValue>,
    #[serde(rename = "priceCurrency", default)]
    pub price_currency: Option<String>,
    // AggregateOffer price range.
    #[serde(rename = "lowPrice", default)]
    pub low_price: Option<ScalarValue>,
    #[serde(rename = "highPrice", default)]
    pub high_price: Option<ScalarValue>,
}

/// A JSON value that is either a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Number(f64),
}

impl ScalarValue {
    pub fn to_text(&self) -> String {
        match self {
            ScalarValue::Text(s) => s.trim().to_string(),
            ScalarValue::Number(n) => n.to_string(),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Flatten one level of `@graph`: a node carrying a graph contributes its
/// members in place of itself; everything else passes through unchanged.
/// Nested `@graph`-within-`@graph` is not recursively flattened.
pub fn normalize_product_nodes(nodes: Vec<JsonLdNode>) -> Vec<JsonLdNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node.graph {
            Some(members) => out.extend(members),
            None => out.push(node),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(js: &str) -> JsonLdNode {
        serde_json::from_str(js).expect("fixture node parses")
    }

    #[test]
    fn product_type_matching_is_strict() {
        assert!(node(r#"{"@type": "Product"}"#).is_product());
        assert!(node(r#"{"@type": "http://schema.org/Product"}"#).is_product());
        assert!(!node(r#"{"@type": "Organization"}"#).is_product());
        assert!(!node(r#"{"@type": ["Product", "Thing"]}"#).is_product());
        assert!(!node(r#"{"name": "untyped"}"#).is_product());
    }

    #[test]
    fn image_field_forms() {
        assert_eq!(
            node(r#"{"image": "https://a/1.jpg"}"#).image.unwrap().first_url(),
            Some("https://a/1.jpg".to_string())
        );
        assert_eq!(
            node(r#"{"image": ["https://a/1.jpg", "https://a/2.jpg"]}"#)
                .image
                .unwrap()
                .first_url(),
            Some("https://a/1.jpg".to_string())
        );
        assert_eq!(
            node(r#"{"image": {"@type": "ImageObject", "url": "https://a/3.jpg"}}"#)
                .image
                .unwrap()
                .first_url(),
            Some("https://a/3.jpg".to_string())
        );
        assert_eq!(node(r#"{"image": {"width": 200}}"#).image.unwrap().first_url(), None);
    }

    #[test]
    fn offers_accept_single_and_list_and_numbers() {
        let single = node(r#"{"offers": {"price": "49.99", "priceCurrency": "EUR"}}"#);
        let offer = single.offers.unwrap();
        let first = offer.first().unwrap();
        assert_eq!(first.price.as_ref().unwrap().to_text(), "49.99");
        assert_eq!(first.price_currency.as_deref(), Some("EUR"));

        let many = node(r#"{"offers": [{"price": 12.5}, {"price": "99"}]}"#);
        let offer = many.offers.unwrap();
        assert_eq!(offer.first().unwrap().price.as_ref().unwrap().to_text(), "12.5");

        let aggregate = node(r#"{"offers": {"lowPrice": 10, "highPrice": 20}}"#);
        let offer = aggregate.offers.unwrap();
        let first = offer.first().unwrap();
        assert_eq!(first.low_price.as_ref().unwrap().to_text(), "10");
        assert_eq!(first.high_price.as_ref().unwrap().to_text(), "20");
    }

    #[test]
    fn graph_flattens_one_level_only() {
        let wrapper = node(
            r#"{
                "@graph": [
                    {"@type": "Organization", "name": "Shop"},
                    {"@type": "Product", "name": "Widget"},
                    {"@graph": [{"@type": "Product", "name": "Nested"}]}
                ]
            }"#,
        );
        let flat = normalize_product_nodes(vec![wrapper]);
        assert_eq!(flat.len(), 3);
        assert!(flat[1].is_product());
        assert_eq!(flat[1].name.as_deref(), Some("Widget"));
        // The nested wrapper survives as-is; its members are not lifted.
        assert!(flat[2].graph.is_some());
        assert!(!flat[2].is_product());
    }

    #[test]
    fn nodes_without_graph_pass_through() {
        let product = node(r#"{"@type": "Product", "name": "Solo"}"#);
        let flat = normalize_product_nodes(vec![product]);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].name.as_deref(), Some("Solo"));
    }
}
