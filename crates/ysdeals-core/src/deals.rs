use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::taxonomy::{AgeBand, Category, Sport, StockLevel, YouthEvidence};

/// Source-specific fields as extracted by a retailer adapter, before any
/// normalization. Discarded once the normalizer has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Identifier of the source that produced this record.
    pub source: String,
    pub url: String,
    pub title: String,
    /// Free-text price as shown on the listing, e.g. `"$19.99"` or `"1.299,99 €"`.
    pub price: String,
    #[serde(default)]
    pub msrp: Option<String>,
    /// ISO 4217 code when the listing states one explicitly.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub gtin: Option<String>,
    #[serde(default)]
    pub mpn: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub brand: Option<String>,
    /// Retailer's own sport label (breadcrumb, department), mapped via source config.
    #[serde(default)]
    pub sport_label: Option<String>,
    /// Retailer's own category label, mapped via source config.
    #[serde(default)]
    pub category_label: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    /// Promotional banner text; coupon codes are extracted from it.
    #[serde(default)]
    pub promo_text: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// A typed product identifier. Ordering is gtin < mpn < sku < synthetic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Identifier {
    Gtin(String),
    Mpn(String),
    /// SKUs are only meaningful within the retailer that issued them.
    Sku { retailer: String, value: String },
    /// `retailer:hash(canonical_url)` for records with no real identifier.
    Synthetic(String),
}

impl Identifier {
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Identifier::Gtin(v) => format!("gtin:{v}"),
            Identifier::Mpn(v) => format!("mpn:{v}"),
            Identifier::Sku { retailer, value } => format!("sku:{retailer}:{value}"),
            Identifier::Synthetic(v) => format!("synthetic:{v}"),
        }
    }
}

/// Canonical product offer produced by the normalizer. Immutable once built;
/// the next fetch cycle produces a new `Deal` rather than updating this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// Stable hash of retailer + strongest identifier. Not a storage key.
    pub deal_id: String,
    pub source: String,
    pub title: String,
    pub brand: Option<String>,
    pub sport: Sport,
    pub category: Category,
    /// USD, rounded to cents.
    pub price: Decimal,
    pub msrp: Option<Decimal>,
    /// `1 - price/msrp` truncated to two places; always in `[0, 1)`.
    pub discount_pct: Option<Decimal>,
    pub identifiers: BTreeSet<Identifier>,
    pub sizes: BTreeSet<String>,
    pub youth_flag: bool,
    pub age_band: Option<AgeBand>,
    pub youth_evidence: YouthEvidence,
    pub retailer: String,
    pub canonical_url: String,
    pub image_url: Option<String>,
    pub stock_level: StockLevel,
    pub coupon_code: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Deal {
    /// Discount fraction for a price/msrp pair.
    ///
    /// Returns `None` when either side is non-positive or the msrp is below
    /// the price. Truncation toward zero keeps the result strictly below 1.
    #[must_use]
    pub fn discount_between(price: Decimal, msrp: Decimal) -> Option<Decimal> {
        if price <= Decimal::ZERO || msrp <= Decimal::ZERO || msrp < price {
            return None;
        }
        let ratio = Decimal::ONE - price / msrp;
        Some(ratio.round_dp_with_strategy(2, RoundingStrategy::ToZero))
    }

    #[must_use]
    pub fn gtin(&self) -> Option<&str> {
        self.identifiers.iter().find_map(|id| match id {
            Identifier::Gtin(v) => Some(v.as_str()),
            _ => None,
        })
    }

    #[must_use]
    pub fn mpn(&self) -> Option<&str> {
        self.identifiers.iter().find_map(|id| match id {
            Identifier::Mpn(v) => Some(v.as_str()),
            _ => None,
        })
    }

    /// Absolute saving against msrp, when one is known.
    #[must_use]
    pub fn savings(&self) -> Option<Decimal> {
        self.msrp.map(|msrp| msrp - self.price)
    }

    /// Discount as `f64`, `0.0` when absent.
    #[must_use]
    pub fn discount_fraction(&self) -> f64 {
        self.discount_pct
            .and_then(|d| d.to_f64())
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn price_f64(&self) -> f64 {
        self.price.to_f64().unwrap_or(0.0)
    }
}
