use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::taxonomy::{AgeBand, Category, Sport};
use crate::ConfigError;

/// Politeness policy for a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePolicy {
    pub requests_per_minute: u32,
    pub burst: u32,
    pub max_retries: u32,
    pub base_backoff_ms: u64,
}

impl Default for SourcePolicy {
    fn default() -> Self {
        Self {
            requests_per_minute: 10,
            burst: 3,
            max_retries: 3,
            base_backoff_ms: 1_000,
        }
    }
}

/// How the built-in adapters reach a source's listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterConfig {
    /// HTTP GET returning a JSON array of raw records or `{ "items": [...] }`.
    JsonListing { url: String },
    /// Local JSON file with the same shape.
    File { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    /// Display name used as `Deal::retailer`.
    pub retailer: String,
    #[serde(default)]
    pub policy: SourcePolicy,
    #[serde(default)]
    pub default_sport: Option<Sport>,
    #[serde(default)]
    pub default_category: Option<Category>,
    #[serde(default)]
    pub sport_map: BTreeMap<String, Sport>,
    #[serde(default)]
    pub category_map: BTreeMap<String, Category>,
    /// Extra youth keywords specific to this retailer's wording.
    #[serde(default)]
    pub youth_keywords: BTreeMap<String, AgeBand>,
    pub adapter: AdapterConfig,
}

impl SourceConfig {
    /// Map a retailer sport label. Label matching ignores case and surrounding
    /// whitespace; an absent label falls back to the source default.
    #[must_use]
    pub fn resolve_sport(&self, label: Option<&str>) -> Option<Sport> {
        match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => lookup_label(&self.sport_map, label),
            None => self.default_sport,
        }
    }

    #[must_use]
    pub fn resolve_category(&self, label: Option<&str>) -> Option<Category> {
        match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => lookup_label(&self.category_map, label),
            None => self.default_category,
        }
    }
}

fn lookup_label<T: Copy>(map: &BTreeMap<String, T>, label: &str) -> Option<T> {
    map.iter()
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(label))
        .map(|(_, v)| *v)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Keyword tables for youth classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YouthConfig {
    /// Lowercase word → age band.
    pub keywords: BTreeMap<String, AgeBand>,
    /// Words that mark a listing as adult; together with a youth keyword the
    /// layer is ambiguous.
    pub adult_keywords: Vec<String>,
    /// Uppercase size code → age band.
    pub size_codes: BTreeMap<String, AgeBand>,
    /// Plain numeric sizes in this range count as kids sizes when every
    /// listed size is numeric.
    pub child_numeric_sizes: Option<NumericRange>,
}

impl Default for YouthConfig {
    fn default() -> Self {
        let keywords = [
            ("youth", AgeBand::Youth),
            ("yth", AgeBand::Youth),
            ("jr", AgeBand::Junior),
            ("junior", AgeBand::Junior),
            ("kids", AgeBand::Kids),
            ("kid", AgeBand::Kids),
            ("boys", AgeBand::Kids),
            ("girls", AgeBand::Kids),
            ("boy", AgeBand::Kids),
            ("girl", AgeBand::Kids),
            ("child", AgeBand::Kids),
            ("children", AgeBand::Kids),
            ("toddler", AgeBand::Kids),
            ("intermediate", AgeBand::AdultSizedDown),
        ];
        let size_codes = [
            ("YXS", AgeBand::Youth),
            ("YS", AgeBand::Youth),
            ("YM", AgeBand::Youth),
            ("YL", AgeBand::Youth),
            ("YXL", AgeBand::Youth),
            ("YXXL", AgeBand::Youth),
            ("YTH", AgeBand::Youth),
            ("JR", AgeBand::Junior),
            ("JUNIOR", AgeBand::Junior),
            ("KIDS", AgeBand::Kids),
            ("KID", AgeBand::Kids),
            ("INT", AgeBand::AdultSizedDown),
        ];
        Self {
            keywords: keywords
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            adult_keywords: ["adult", "men", "mens", "women", "womens", "senior"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            size_codes: size_codes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            child_numeric_sizes: Some(NumericRange { min: 1.0, max: 6.0 }),
        }
    }
}

/// Brand prestige table on a 0–10 scale plus per-sport bonuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandWeights {
    /// Uppercase brand name → prestige.
    pub prestige: BTreeMap<String, f64>,
    pub sport_bonus: BTreeMap<Sport, BTreeMap<String, f64>>,
    /// Prestige assumed for a brand missing from the table.
    pub unknown_brand: f64,
}

impl BrandWeights {
    /// Prestige plus sport bonus for a brand, before scaling.
    #[must_use]
    pub fn raw_score(&self, brand: &str, sport: Sport) -> f64 {
        let key = brand.trim().to_uppercase();
        let base = self
            .prestige
            .get(&key)
            .copied()
            .unwrap_or(self.unknown_brand);
        let bonus = self
            .sport_bonus
            .get(&sport)
            .and_then(|m| m.get(&key))
            .copied()
            .unwrap_or(0.0);
        base + bonus
    }
}

impl Default for BrandWeights {
    fn default() -> Self {
        let prestige = [
            ("NIKE", 8.5),
            ("ADIDAS", 8.0),
            ("UNDER ARMOUR", 7.5),
            ("PUMA", 7.0),
            ("NEW BALANCE", 7.0),
            ("ASICS", 6.5),
            ("MIZUNO", 6.5),
            ("WILSON", 6.5),
            ("HEAD", 6.5),
            ("BABOLAT", 6.5),
            ("BAUER", 8.0),
            ("CCM", 7.5),
            ("WARRIOR", 7.0),
            ("SHER-WOOD", 6.5),
            ("EASTON", 7.0),
            ("RAWLINGS", 7.0),
            ("LOUISVILLE", 6.5),
            ("MOLTEN", 6.0),
            ("SPALDING", 6.0),
            ("UMBRO", 6.5),
            ("KAPPA", 6.0),
            ("DIADORA", 6.0),
            ("BROOKS", 7.5),
            ("SAUCONY", 7.0),
            ("HOKA", 7.5),
            ("ON", 7.0),
            ("ALTRA", 6.5),
            ("CHAMPION", 5.0),
            ("RUSSELL", 4.5),
            ("STARTER", 4.0),
            ("FRUIT OF THE LOOM", 3.5),
        ];
        let bonus = |pairs: &[(&str, f64)]| -> BTreeMap<String, f64> {
            pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
        };
        let mut sport_bonus = BTreeMap::new();
        sport_bonus.insert(
            Sport::Hockey,
            bonus(&[("BAUER", 2.0), ("CCM", 1.5), ("WARRIOR", 1.0), ("SHER-WOOD", 0.5)]),
        );
        sport_bonus.insert(
            Sport::Baseball,
            bonus(&[("EASTON", 1.5), ("RAWLINGS", 1.5), ("WILSON", 1.0), ("LOUISVILLE", 1.0)]),
        );
        sport_bonus.insert(
            Sport::Soccer,
            bonus(&[("ADIDAS", 1.0), ("NIKE", 1.0), ("PUMA", 0.5), ("UMBRO", 0.5)]),
        );
        sport_bonus.insert(
            Sport::Tennis,
            bonus(&[("WILSON", 1.5), ("HEAD", 1.5), ("BABOLAT", 1.5), ("YONEX", 1.0)]),
        );
        sport_bonus.insert(
            Sport::Running,
            bonus(&[("BROOKS", 1.5), ("SAUCONY", 1.0), ("HOKA", 1.5), ("ASICS", 1.0)]),
        );
        Self {
            prestige: prestige
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            sport_bonus,
            unknown_brand: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub discount: f64,
    pub price: f64,
    pub youth: f64,
    pub brand: f64,
    pub inventory: f64,
}

impl ScoringWeights {
    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("discount", self.discount),
            ("price", self.price),
            ("youth", self.youth),
            ("brand", self.brand),
            ("inventory", self.inventory),
        ]
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            discount: 0.45,
            price: 0.20,
            youth: 0.20,
            brand: 0.10,
            inventory: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupThresholds {
    /// Minimum token-set similarity for a fuzzy title match.
    pub title_similarity: f64,
    /// Maximum relative price difference for a fuzzy match.
    pub price_tolerance: f64,
}

impl Default for DedupThresholds {
    fn default() -> Self {
        Self {
            title_similarity: 0.85,
            price_tolerance: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingOptions {
    pub min_discount: f64,
    pub top_per_sport: Option<usize>,
    pub youth_only: bool,
    pub in_stock_only: bool,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            min_discount: 0.20,
            top_per_sport: Some(8),
            youth_only: false,
            in_stock_only: false,
        }
    }
}

/// Fully parsed pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub youth: YouthConfig,
    #[serde(default)]
    pub brands: BrandWeights,
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub dedup: DedupThresholds,
    #[serde(default)]
    pub ranking: RankingOptions,
    /// ISO 4217 code → USD multiplier. USD itself is implicit.
    #[serde(default)]
    pub currency_rates: BTreeMap<String, f64>,
}

impl PipelineConfig {
    #[must_use]
    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// USD multiplier for a currency code, `None` when unsupported.
    #[must_use]
    pub fn usd_rate(&self, code: &str) -> Option<f64> {
        let code = code.trim().to_uppercase();
        if code == "USD" {
            return Some(1.0);
        }
        self.currency_rates
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(&code))
            .map(|(_, v)| *v)
    }

    /// Check structural invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_ids = HashSet::new();
        for source in &self.sources {
            validate_source(source)?;
            if !seen_ids.insert(source.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate source id: '{}'",
                    source.id
                )));
            }
        }

        let weights = self.scoring.named();
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    name: format!("scoring.{name}"),
                    value,
                });
            }
        }
        if weights.iter().map(|(_, v)| v).sum::<f64>() <= 0.0 {
            return Err(ConfigError::Validation(
                "scoring weights must not all be zero".to_string(),
            ));
        }

        for (brand, value) in &self.brands.prestige {
            if !value.is_finite() || !(0.0..=10.0).contains(value) {
                return Err(ConfigError::InvalidWeight {
                    name: format!("brands.prestige.{brand}"),
                    value: *value,
                });
            }
        }
        for (sport, bonuses) in &self.brands.sport_bonus {
            for (brand, value) in bonuses {
                if !value.is_finite() || *value < 0.0 {
                    return Err(ConfigError::InvalidWeight {
                        name: format!("brands.sport_bonus.{sport}.{brand}"),
                        value: *value,
                    });
                }
            }
        }
        if !self.brands.unknown_brand.is_finite() || self.brands.unknown_brand < 0.0 {
            return Err(ConfigError::InvalidWeight {
                name: "brands.unknown_brand".to_string(),
                value: self.brands.unknown_brand,
            });
        }

        let sim = self.dedup.title_similarity;
        if !(sim > 0.0 && sim <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "dedup.title_similarity must be in (0, 1], got {sim}"
            )));
        }
        let tol = self.dedup.price_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(ConfigError::Validation(format!(
                "dedup.price_tolerance must be non-negative, got {tol}"
            )));
        }

        let min = self.ranking.min_discount;
        if !(0.0..1.0).contains(&min) {
            return Err(ConfigError::Validation(format!(
                "ranking.min_discount must be in [0, 1), got {min}"
            )));
        }
        if self.ranking.top_per_sport == Some(0) {
            return Err(ConfigError::Validation(
                "ranking.top_per_sport must be at least 1 when set".to_string(),
            ));
        }

        for (code, rate) in &self.currency_rates {
            if !rate.is_finite() || *rate <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "currency rate for '{code}' must be positive, got {rate}"
                )));
            }
        }

        if let Some(range) = self.youth.child_numeric_sizes {
            if range.min > range.max {
                return Err(ConfigError::Validation(format!(
                    "youth.child_numeric_sizes min {} exceeds max {}",
                    range.min, range.max
                )));
            }
        }

        Ok(())
    }
}

fn validate_source(source: &SourceConfig) -> Result<(), ConfigError> {
    if source.id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "source id must be non-empty".to_string(),
        ));
    }
    if source.retailer.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "source '{}' has an empty retailer name",
            source.id
        )));
    }
    if source.policy.requests_per_minute == 0 {
        return Err(ConfigError::Validation(format!(
            "source '{}' requests_per_minute must be at least 1",
            source.id
        )));
    }
    if source.policy.burst == 0 {
        return Err(ConfigError::Validation(format!(
            "source '{}' burst must be at least 1",
            source.id
        )));
    }
    if source.default_sport.is_none() && source.sport_map.is_empty() {
        return Err(ConfigError::MissingTaxonomy {
            source_id: source.id.clone(),
            kind: "sport",
        });
    }
    if source.default_category.is_none() && source.category_map.is_empty() {
        return Err(ConfigError::MissingTaxonomy {
            source_id: source.id.clone(),
            kind: "category",
        });
    }
    Ok(())
}

/// Load and validate the pipeline configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: PipelineConfig =
        serde_yaml::from_str(&content).map_err(ConfigError::ConfigFileParse)?;

    config.validate()?;

    Ok(config)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
