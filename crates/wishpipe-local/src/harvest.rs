//! HTML head harvest: flat tag map plus JSON-LD nodes.
//!
//! The structured fetch capability is fed from here: every
//! `<meta property=...>` / `<meta name=...>` pair with non-empty content
//! (first occurrence wins, keys stay case-sensitive), the `<title>` element
//! under key `title`, and each `application/ld+json` script parsed
//! leniently: a block that is not valid JSON, or a node the model cannot
//! absorb, is skipped rather than failing the page.

use html_scraper::{Html, Selector};
use wishpipe_core::jsonld::JsonLdNode;
use wishpipe_core::{PageMetadata, RawTagMap};

pub fn harvest_page(html: &str) -> PageMetadata {
    let doc = Html::parse_document(html);
    PageMetadata {
        tags: harvest_tags(&doc),
        json_ld: harvest_json_ld(&doc),
    }
}

fn harvest_tags(doc: &Html) -> RawTagMap {
    let mut tags = RawTagMap::new();

    if let Ok(sel) = Selector::parse("meta") {
        for el in doc.select(&sel) {
            let content = el.value().attr("content").unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            // property= carries the og:/product:/article: namespaces;
            // name= carries twitter:* and the plain tags.
            for key in [el.value().attr("property"), el.value().attr("name")]
                .into_iter()
                .flatten()
            {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                tags.entry(key.to_string())
                    .or_insert_with(|| content.to_string());
            }
        }
    }

    if let Ok(sel) = Selector::parse("title") {
        if let Some(el) = doc.select(&sel).next() {
            let text = el.text().collect::<String>();
            let text = text.trim();
            if !text.is_empty() {
                // A meta tag named "title" outranks the element.
                tags.entry("title".to_string())
                    .or_insert_with(|| text.to_string());
            }
        }
    }

    tags
}

fn harvest_json_ld(doc: &Html) -> Vec<JsonLdNode> {
    let sel = match Selector::parse(r#"script[type="application/ld+json"]"#) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut nodes = Vec::new();
    for el in doc.select(&sel) {
        let raw = el.inner_html();
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
            continue;
        };
        match value {
            serde_json::Value::Array(items) => nodes.extend(
                items
                    .into_iter()
                    .filter_map(|v| serde_json::from_value::<JsonLdNode>(v).ok()),
            ),
            other => {
                if let Ok(node) = serde_json::from_value::<JsonLdNode>(other) {
                    nodes.push(node);
                }
            }
        }
    }
    nodes
}
