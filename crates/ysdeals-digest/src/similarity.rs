//! Title and price comparison for fuzzy duplicate matching.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

/// Lowercase alphanumeric tokens of `title`, minus any token of `brand`.
///
/// `"Adidas Copa Youth Cleat"` with brand `adidas` → `{copa, cleat, youth}`.
#[must_use]
pub fn title_tokens(title: &str, brand: Option<&str>) -> BTreeSet<String> {
    let words = |text: &str| -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    };
    let brand_words: BTreeSet<String> = brand.map(words).unwrap_or_default().into_iter().collect();
    words(title)
        .into_iter()
        .filter(|w| !brand_words.contains(w))
        .collect()
}

/// Sørensen–Dice coefficient `2|A∩B| / (|A|+|B|)`. Two empty sets score 0.
#[must_use]
pub fn dice(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = (2 * shared) as f64 / total as f64;
    ratio
}

/// `|a − b| / mean(a, b) ≤ tolerance`. Two zero prices match; zero against
/// non-zero never does.
#[must_use]
pub fn price_within(a: Decimal, b: Decimal, tolerance: f64) -> bool {
    if a.is_zero() || b.is_zero() {
        return a == b;
    }
    // Halve before adding; `a + b` overflows near `Decimal::MAX`.
    let mean = a / Decimal::TWO + b / Decimal::TWO;
    let relative = (a - b).abs() / mean;
    Decimal::try_from(tolerance).is_ok_and(|t| relative <= t)
}
