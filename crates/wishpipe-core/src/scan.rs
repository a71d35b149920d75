//! Raw-HTML fallback extraction.
//!
//! Last resort for pages whose structured metadata left price or image
//! unresolved. Pure string scanning over the raw body: the matched site
//! profile's extractors run first, then the generic chain. Nothing here can
//! fail a request.

use crate::resolve::sanitize_price;
use crate::sites;
use regex::Regex;
use std::sync::LazyLock;

static AMAZON_OFFSCREEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="a-offscreen">([^<]+)<"#).expect("hardcoded pattern"));
static AMAZON_PRICE_WHOLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="a-price-whole">([^<]+)<"#).expect("hardcoded pattern"));
static AMAZON_PRICE_FRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="a-price-fraction">([^<]+)<"#).expect("hardcoded pattern")
});
static AMAZON_LARGE_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""large":"(https://m\.media-amazon\.com/images/I/[^"]+)""#)
        .expect("hardcoded pattern")
});

static SHEIN_SALE_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""salePrice"\s*:\s*"?(\d+\.?\d*)"?"#).expect("hardcoded pattern")
});
static SHEIN_RETAIL_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""retailPrice"\s*:\s*"?(\d+\.?\d*)"?"#).expect("hardcoded pattern")
});
static SHEIN_PRODUCT_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""productPrice"\s*:\s*"?(\d+\.?\d*)"?"#).expect("hardcoded pattern")
});
static SHEIN_ORIGINAL_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""original_image_url"\s*:\s*"(https://[^"]+)""#).expect("hardcoded pattern")
});
static SHEIN_MAIN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""mainImage"\s*:\s*"(https://[^"]+)""#).expect("hardcoded pattern")
});

static GENERIC_JSON_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price"\s*:\s*"?(\d+\.?\d*)"?"#).expect("hardcoded pattern"));
static GENERIC_IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img[^>]+src="(https://[^"]+\.(?:jpg|png|webp))""#).expect("hardcoded pattern")
});

/// What a raw-body scan recovered. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawScan {
    pub price: Option<String>,
    pub image: Option<String>,
}

/// Scan `html` for the still-missing fields. Site extractors for the
/// matched profile first, generic extractors as the fallback.
pub fn scan_raw_html(html: &str, url: &str) -> RawScan {
    let host = sites::host_of(url);
    let profile = sites::profile_for_host(&host);
    let price = profile
        .and_then(|p| p.scan_price)
        .and_then(|scan| scan(html))
        .or_else(|| generic_price(html));
    let image = profile
        .and_then(|p| p.scan_image)
        .and_then(|scan| scan(html))
        .or_else(|| generic_image(html));
    RawScan { price, image }
}

/// Shein embeds its offer state as JSON in an inline script.
pub(crate) fn shein_price(html: &str) -> Option<String> {
    [&*SHEIN_SALE_PRICE, &*SHEIN_RETAIL_PRICE, &*SHEIN_PRODUCT_PRICE]
        .into_iter()
        .find_map(|re| re.captures(html).map(|c| c[1].to_string()))
}

pub(crate) fn shein_image(html: &str) -> Option<String> {
    [&*SHEIN_ORIGINAL_IMAGE, &*SHEIN_MAIN_IMAGE]
        .into_iter()
        .find_map(|re| re.captures(html).map(|c| c[1].to_string()))
}

pub(crate) fn amazon_image(html: &str) -> Option<String> {
    AMAZON_LARGE_IMAGE.captures(html).map(|c| c[1].to_string())
}

// The Amazon price classes are probed on every host: the class names are
// specific enough that a match elsewhere is still a price.
fn generic_price(html: &str) -> Option<String> {
    if let Some(price) = AMAZON_OFFSCREEN
        .captures(html)
        .and_then(|c| sanitize_price(&c[1]))
    {
        return Some(price);
    }
    if let Some(whole) = AMAZON_PRICE_WHOLE.captures(html) {
        let joined = match AMAZON_PRICE_FRACTION.captures(html) {
            Some(fraction) => format!("{}.{}", &whole[1], &fraction[1]),
            None => whole[1].to_string(),
        };
        if let Some(price) = sanitize_price(&joined) {
            return Some(price);
        }
    }
    GENERIC_JSON_PRICE.captures(html).map(|c| c[1].to_string())
}

/// First https `<img>` with a jpg/png/webp source, in document order.
fn generic_image(html: &str) -> Option<String> {
    GENERIC_IMG_TAG.captures(html).map(|c| c[1].to_string())
}
