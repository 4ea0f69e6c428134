//! Serde shapes for JSON listings. Fields are lenient so a single bad record
//! is dropped by the normalizer instead of failing the whole source.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use ysdeals_core::RawRecord;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ListingPayload {
    Wrapped { items: Vec<ListingItem> },
    Bare(Vec<ListingItem>),
}

impl ListingPayload {
    pub(super) fn into_items(self) -> Vec<ListingItem> {
        match self {
            ListingPayload::Wrapped { items } | ListingPayload::Bare(items) => items,
        }
    }
}

/// A scalar that retailers send either quoted or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ListingItem {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    price: Option<Scalar>,
    #[serde(default, alias = "compare_at_price", alias = "list_price")]
    msrp: Option<Scalar>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default, alias = "upc", alias = "ean")]
    gtin: Option<Scalar>,
    #[serde(default)]
    mpn: Option<Scalar>,
    #[serde(default)]
    sku: Option<Scalar>,
    #[serde(default)]
    sizes: Vec<Scalar>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default, alias = "sport")]
    sport_label: Option<String>,
    #[serde(default, alias = "category")]
    category_label: Option<String>,
    #[serde(default)]
    availability: Option<String>,
    #[serde(default, alias = "promo")]
    promo_text: Option<String>,
    #[serde(default, alias = "image")]
    image_url: Option<String>,
}

impl ListingItem {
    pub(super) fn into_raw(self, source_id: &str, fetched_at: DateTime<Utc>) -> RawRecord {
        RawRecord {
            source: source_id.to_string(),
            url: self.url,
            title: self.title,
            price: self.price.map(Scalar::into_string).unwrap_or_default(),
            msrp: self.msrp.map(Scalar::into_string),
            currency: self.currency,
            gtin: self.gtin.map(Scalar::into_string),
            mpn: self.mpn.map(Scalar::into_string),
            sku: self.sku.map(Scalar::into_string),
            sizes: self.sizes.into_iter().map(Scalar::into_string).collect(),
            brand: self.brand,
            sport_label: self.sport_label,
            category_label: self.category_label,
            availability: self.availability,
            promo_text: self.promo_text,
            image_url: self.image_url,
            fetched_at,
        }
    }
}
