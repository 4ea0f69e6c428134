//! Text helpers for turning retailer free text into typed values.
//!
//! All functions are pure and tolerant: unrecognizable input yields `None`
//! (or an empty collection) rather than an error, leaving the decision to
//! drop a record to [`crate::normalize`].

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use ysdeals_core::StockLevel;

static PRICE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:price|cost|was|now|sale|from)\b\s*:?\s*")
        .expect("valid price label regex")
});
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("valid number regex"));
static THOUSANDS_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:,\d{3})+$").expect("valid thousands regex"));
static THOUSANDS_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}(?:\.\d{3})+$").expect("valid thousands regex"));
static SKU_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:sku|item|product)\s*#?\s*:?\s*").expect("valid sku prefix regex")
});
static SKU_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{2,}$").expect("valid sku regex"));
static ALL_CAPS_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2,})\b").expect("valid caps regex"));
static ONLY_N_LEFT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"only\s+\d+\s+left").expect("valid stock regex"));
static COUPON_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"USE\s+CODE\s+([A-Z0-9]{3,20})\b",
        r"(?:CODE|COUPON)[\s:]*([A-Z0-9]{3,20})\b",
        r"SAVE\s+(?:WITH\s+CODE\s+)?([A-Z0-9]{3,20})\b",
        r"\b([A-Z0-9]{3,20})\s+(?:OFF|DISCOUNT)\b",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid coupon regex"))
    .collect()
});

const BRAND_STOPWORDS: &[&str] = &[
    "the", "new", "best", "top", "pro", "elite", "youth", "kid", "kids", "jr", "junior",
];

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#039;", "'"),
    ("&apos;", "'"),
    ("&rsquo;", "'"),
    ("&reg;", "®"),
    ("&trade;", "™"),
];

/// A price amount with the currency implied by its symbol, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPrice {
    pub amount: Decimal,
    pub currency: Option<&'static str>,
}

/// Decodes common HTML entities and collapses runs of whitespace.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let mut decoded = text.to_string();
    for (entity, replacement) in ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }
    // Last, so "&amp;lt;" decodes to "&lt;" rather than "<".
    decoded = decoded.replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn currency_from_symbol(text: &str) -> Option<&'static str> {
    if text.contains('€') {
        Some("EUR")
    } else if text.contains('£') {
        Some("GBP")
    } else if text.contains("CA$") || text.contains("C$") {
        Some("CAD")
    } else if text.contains('$') {
        Some("USD")
    } else {
        None
    }
}

/// Resolves thousands and decimal separators in a numeric token.
fn normalize_separators(token: &str, currency: Option<&str>) -> Option<String> {
    let commas = token.matches(',').count();
    let dots = token.matches('.').count();
    let normalized = match (commas, dots) {
        (0, 0) => token.to_string(),
        (_, 0) => {
            if THOUSANDS_COMMA.is_match(token) {
                token.replace(',', "")
            } else if commas == 1 {
                token.replace(',', ".")
            } else {
                return None;
            }
        }
        (0, _) => {
            let decimals = token.rsplit('.').next().map_or(0, str::len);
            if dots > 1 || (currency == Some("EUR") && decimals == 3) {
                if !THOUSANDS_DOT.is_match(token) {
                    return None;
                }
                token.replace('.', "")
            } else {
                token.to_string()
            }
        }
        _ => {
            let last_comma = token.rfind(',')?;
            let last_dot = token.rfind('.')?;
            if last_comma > last_dot {
                token.replace('.', "").replace(',', ".")
            } else {
                token.replace(',', "")
            }
        }
    };
    Some(normalized)
}

/// Parses a displayed price such as `"$19.99"`, `"Now: $1,299.00"`,
/// `"1.299,99 €"` or `"$20 - $30"` (first value of a range).
///
/// Returns `None` when no numeric value is recoverable.
#[must_use]
pub fn parse_price(text: &str) -> Option<ParsedPrice> {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return None;
    }
    let currency = currency_from_symbol(&cleaned);
    let stripped = PRICE_LABEL.replace_all(&cleaned, " ");
    let token = NUMBER
        .find(&stripped)?
        .as_str()
        .trim_end_matches(['.', ',']);
    let normalized = normalize_separators(token, currency)?;
    let amount = Decimal::from_str(&normalized).ok()?;
    Some(ParsedPrice { amount, currency })
}

fn normalize_size(size: &str) -> String {
    let upper = size.trim().to_uppercase();
    match upper.as_str() {
        "JUNIOR" => "JR".to_string(),
        "KID" => "KIDS".to_string(),
        "BOYS" => "BOY".to_string(),
        "GIRLS" => "GIRL".to_string(),
        _ => upper,
    }
}

/// Trims, uppercases and deduplicates sizes. Entries like `"YS, YM / YL"` are
/// split into their parts.
#[must_use]
pub fn parse_sizes(sizes: &[String]) -> BTreeSet<String> {
    sizes
        .iter()
        .flat_map(|s| {
            clean_text(s)
                .split([',', '/', '|'])
                .map(normalize_size)
                .collect::<Vec<_>>()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Strips `sku:`/`item:` style prefixes and uppercases. Rejects anything that
/// is not at least two characters of `[A-Za-z0-9._-]`.
#[must_use]
pub fn clean_sku(sku: &str) -> Option<String> {
    let cleaned = clean_text(sku);
    let body = SKU_PREFIX.replace(&cleaned, "");
    let body = body.trim();
    if SKU_BODY.is_match(body) {
        Some(body.to_uppercase())
    } else {
        None
    }
}

/// GTIN/UPC/EAN: digits only once spaces and hyphens are removed.
#[must_use]
pub fn clean_gtin(gtin: &str) -> Option<String> {
    let digits: String = gtin
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

#[must_use]
pub fn clean_mpn(mpn: &str) -> Option<String> {
    let cleaned = clean_text(mpn).to_uppercase();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Guesses a brand from a product title: the first word unless it is a
/// generic marketing or age word, else the first all-caps token.
#[must_use]
pub fn extract_brand_from_title(title: &str) -> Option<String> {
    let title = clean_text(title);
    let first = title.split_whitespace().next()?;
    let letters: String = first.chars().filter(char::is_ascii_alphabetic).collect();
    if !letters.is_empty() && !BRAND_STOPWORDS.contains(&letters.to_lowercase().as_str()) {
        let trimmed = first.trim_end_matches(|c: char| !c.is_alphanumeric());
        return Some(trimmed.to_string());
    }

    ALL_CAPS_WORD
        .captures_iter(&title)
        .map(|c| c[1].to_string())
        .find(|w| !BRAND_STOPWORDS.contains(&w.to_lowercase().as_str()))
}

/// Maps free availability text to a stock level. Absent text means in stock.
#[must_use]
pub fn stock_level(availability: Option<&str>) -> StockLevel {
    let Some(text) = availability else {
        return StockLevel::InStock;
    };
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has = |w: &str| words.iter().any(|x| *x == w);

    if has("out") || has("sold") || has("unavailable") || has("outofstock") || has("soldout") {
        StockLevel::Out
    } else if has("limited")
        || has("low")
        || has("limitedavailability")
        || ONLY_N_LEFT.is_match(&lower)
    {
        StockLevel::Limited
    } else {
        StockLevel::InStock
    }
}

/// Pulls a coupon code out of promotional text, e.g. `"Use code SAVE20"`.
/// Codes are 3 to 20 alphanumerics and must contain a digit.
#[must_use]
pub fn extract_coupon(promo: &str) -> Option<String> {
    let normalized = clean_text(promo).to_uppercase();
    if normalized.is_empty() {
        return None;
    }
    COUPON_PATTERNS.iter().find_map(|re| {
        re.captures_iter(&normalized)
            .map(|c| c[1].to_string())
            .find(|code| code.chars().any(|ch| ch.is_ascii_digit()))
    })
}

/// Trims a listing URL and drops its fragment.
#[must_use]
pub fn canonical_url(url: &str) -> String {
    let trimmed = url.trim();
    trimmed
        .split_once('#')
        .map_or(trimmed, |(base, _)| base)
        .to_string()
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
