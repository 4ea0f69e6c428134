//! Rule-based youth classification.
//!
//! Three layers are evaluated in order and the first decisive one wins:
//! sizes, then title keywords, then the retailer's category label. A keyword
//! layer that sees both youth and adult words is decisive and ambiguous: the
//! deal is not flagged as youth.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use ysdeals_core::{AgeBand, YouthConfig, YouthEvidence};

static KID_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}(?:\.5)?[YKC]$").expect("valid kid size regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct YouthClassification {
    pub youth_flag: bool,
    pub age_band: Option<AgeBand>,
    pub evidence: YouthEvidence,
}

impl YouthClassification {
    fn youth(band: AgeBand, evidence: YouthEvidence) -> Self {
        Self {
            youth_flag: true,
            age_band: Some(band),
            evidence,
        }
    }

    fn ambiguous() -> Self {
        Self {
            youth_flag: false,
            age_band: None,
            evidence: YouthEvidence::Ambiguous,
        }
    }
}

enum KeywordVerdict {
    Youth(AgeBand),
    Adult,
    Ambiguous,
    NoSignal,
}

/// Lowercase alphanumeric tokens; `"Boy's Jr-Goalie"` → `boy s jr goalie`.
fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Position of `phrase` as a contiguous token run within `haystack`.
fn phrase_position(haystack: &[String], phrase: &str) -> Option<usize> {
    let needle = tokens(phrase);
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle.as_slice())
}

fn size_band(size: &str, config: &YouthConfig) -> Option<AgeBand> {
    let upper = size.trim().to_uppercase();
    if let Some(band) = config.size_codes.get(&upper) {
        return Some(*band);
    }
    if KID_SIZE.is_match(&upper) {
        return Some(AgeBand::Kids);
    }
    None
}

fn classify_sizes(sizes: &BTreeSet<String>, config: &YouthConfig) -> Option<AgeBand> {
    if let Some(band) = sizes.iter().filter_map(|s| size_band(s, config)).min() {
        return Some(band);
    }

    let range = config.child_numeric_sizes?;
    let numeric: Vec<f64> = sizes
        .iter()
        .map_while(|s| s.trim().parse::<f64>().ok())
        .collect();
    if !numeric.is_empty()
        && numeric.len() == sizes.len()
        && numeric.iter().all(|n| range.contains(*n))
    {
        return Some(AgeBand::Kids);
    }
    None
}

fn classify_text(
    text: &str,
    source_keywords: &BTreeMap<String, AgeBand>,
    config: &YouthConfig,
) -> KeywordVerdict {
    let words = tokens(text);
    if words.is_empty() {
        return KeywordVerdict::NoSignal;
    }

    let youth = config
        .keywords
        .iter()
        .chain(source_keywords.iter())
        .filter_map(|(kw, band)| phrase_position(&words, kw).map(|pos| (pos, *band)))
        .min_by_key(|(pos, band)| (*pos, *band));
    let adult = config
        .adult_keywords
        .iter()
        .any(|kw| phrase_position(&words, kw).is_some());

    match (youth, adult) {
        (Some(_), true) => KeywordVerdict::Ambiguous,
        (Some((_, band)), false) => KeywordVerdict::Youth(band),
        (None, true) => KeywordVerdict::Adult,
        (None, false) => KeywordVerdict::NoSignal,
    }
}

/// Classifies a listing. Identical input always yields identical output.
#[must_use]
pub fn classify_youth(
    title: &str,
    sizes: &BTreeSet<String>,
    category_label: Option<&str>,
    source_keywords: &BTreeMap<String, AgeBand>,
    config: &YouthConfig,
) -> YouthClassification {
    if let Some(band) = classify_sizes(sizes, config) {
        return YouthClassification::youth(band, YouthEvidence::Size);
    }

    let layers = [
        (Some(title), YouthEvidence::TitleKeyword),
        (category_label, YouthEvidence::CategoryKeyword),
    ];
    for (text, evidence) in layers {
        let Some(text) = text else { continue };
        match classify_text(text, source_keywords, config) {
            KeywordVerdict::Youth(band) => return YouthClassification::youth(band, evidence),
            KeywordVerdict::Ambiguous => return YouthClassification::ambiguous(),
            KeywordVerdict::Adult => return YouthClassification::default(),
            KeywordVerdict::NoSignal => {}
        }
    }

    YouthClassification::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn classify(title: &str, size_list: &[&str], category: Option<&str>) -> YouthClassification {
        classify_youth(
            title,
            &sizes(size_list),
            category,
            &BTreeMap::new(),
            &YouthConfig::default(),
        )
    }

    #[test]
    fn youth_size_code_wins() {
        let c = classify("Performance Tee", &["YS", "YM", "YL"], None);
        assert!(c.youth_flag);
        assert_eq!(c.age_band, Some(AgeBand::Youth));
        assert_eq!(c.evidence, YouthEvidence::Size);
    }

    #[test]
    fn size_layer_beats_adult_title() {
        let c = classify("Men's Style Tee", &["YM"], None);
        assert!(c.youth_flag);
        assert_eq!(c.evidence, YouthEvidence::Size);
    }

    #[test]
    fn kid_shoe_sizes_are_kids() {
        let c = classify("Copa Cleat", &["11C", "12C", "1Y"], None);
        assert_eq!(c.age_band, Some(AgeBand::Kids));
    }

    #[test]
    fn numeric_sizes_in_child_range() {
        let c = classify("Match Ball", &["3", "4"], None);
        assert_eq!(c.age_band, Some(AgeBand::Kids));
        let adult = classify("Trainer", &["5", "9", "11"], None);
        assert!(!adult.youth_flag);
    }

    #[test]
    fn intermediate_maps_to_adult_sized_down() {
        let c = classify("Vapor Intermediate Stick", &[], None);
        assert!(c.youth_flag);
        assert_eq!(c.age_band, Some(AgeBand::AdultSizedDown));
        assert_eq!(c.evidence, YouthEvidence::TitleKeyword);

        let sized = classify("Vapor Stick", &["INT"], None);
        assert_eq!(sized.age_band, Some(AgeBand::AdultSizedDown));
    }

    #[test]
    fn title_keyword_uses_word_boundaries() {
        // "junior" must not match inside "juniorette", nor "kid" inside "kidskin".
        let c = classify("Kidskin Leather Glove", &[], None);
        assert!(!c.youth_flag);
    }

    #[test]
    fn junior_title_keyword() {
        let c = classify("Bauer Jr. Hockey Gloves", &[], None);
        assert_eq!(c.age_band, Some(AgeBand::Junior));
        assert_eq!(c.evidence, YouthEvidence::TitleKeyword);
    }

    #[test]
    fn youth_and_adult_in_title_is_ambiguous() {
        let c = classify("Youth & Adult Shin Guards", &[], Some("Kids Gear"));
        assert!(!c.youth_flag);
        assert_eq!(c.age_band, None);
        assert_eq!(c.evidence, YouthEvidence::Ambiguous);
    }

    #[test]
    fn adult_title_stops_before_category() {
        let c = classify("Men's Running Shoe", &[], Some("Kids Shoes"));
        assert!(!c.youth_flag);
        assert_eq!(c.evidence, YouthEvidence::None);
    }

    #[test]
    fn category_label_is_last_resort() {
        let c = classify("Predator Club Cleat", &[], Some("Boys' Cleats"));
        assert!(c.youth_flag);
        assert_eq!(c.evidence, YouthEvidence::CategoryKeyword);
        assert_eq!(c.age_band, Some(AgeBand::Kids));
    }

    #[test]
    fn source_keywords_extend_the_table() {
        let mut extra = BTreeMap::new();
        extra.insert("little league".to_string(), AgeBand::Youth);
        let c = classify_youth(
            "Little League Bat",
            &BTreeSet::new(),
            None,
            &extra,
            &YouthConfig::default(),
        );
        assert!(c.youth_flag);
        assert_eq!(c.age_band, Some(AgeBand::Youth));
    }

    #[test]
    fn no_signal_is_not_youth() {
        let c = classify("Training Cones", &["ONE SIZE"], Some("Equipment"));
        assert_eq!(c, YouthClassification::default());
    }

    #[test]
    fn classification_is_deterministic() {
        let a = classify("Youth Jr Kids Glove", &[], None);
        let b = classify("Youth Jr Kids Glove", &[], None);
        assert_eq!(a, b);
        assert_eq!(a.age_band, Some(AgeBand::Youth));
    }
}
