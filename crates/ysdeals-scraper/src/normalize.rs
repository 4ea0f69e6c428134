//! Normalization from [`RawRecord`] to the canonical [`Deal`].
//!
//! Text parsing is delegated to [`crate::parse`] and youth rules to
//! [`crate::youth`]; this module owns the drop decisions and identity.
//! [`normalize_record`] is a pure function of its inputs.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sha2::{Digest, Sha256};
use ysdeals_core::{Deal, Identifier, PipelineConfig, RawRecord, SourceConfig};

use crate::error::NormalizationError;
use crate::parse::{
    canonical_url, clean_gtin, clean_mpn, clean_sku, clean_text, extract_brand_from_title,
    extract_coupon, parse_price, parse_sizes, stock_level,
};
use crate::youth::classify_youth;

/// A record the normalizer refused, kept for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    pub url: String,
    pub title: String,
    pub error: NormalizationError,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub deals: Vec<Deal>,
    pub dropped: Vec<DroppedRecord>,
}

impl NormalizedBatch {
    /// Drop counts keyed by [`NormalizationError::reason`].
    #[must_use]
    pub fn drop_reasons(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for dropped in &self.dropped {
            *counts.entry(dropped.error.reason()).or_insert(0) += 1;
        }
        counts
    }
}

fn short_hash(input: &str) -> String {
    let mut hex = format!("{:x}", Sha256::digest(input.as_bytes()));
    hex.truncate(16);
    hex
}

fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn to_usd_cents(
    amount: Decimal,
    rate: Decimal,
    raw: &str,
) -> Result<Decimal, NormalizationError> {
    amount
        .checked_mul(rate)
        .map(to_cents)
        .ok_or_else(|| NormalizationError::PriceOutOfRange {
            raw: raw.to_string(),
        })
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(clean_text).filter(|t| !t.is_empty())
}

fn collect_identifiers(raw: &RawRecord, retailer: &str, url: &str) -> BTreeSet<Identifier> {
    let mut identifiers = BTreeSet::new();
    if let Some(gtin) = raw.gtin.as_deref().and_then(clean_gtin) {
        identifiers.insert(Identifier::Gtin(gtin));
    }
    if let Some(mpn) = raw.mpn.as_deref().and_then(clean_mpn) {
        identifiers.insert(Identifier::Mpn(mpn));
    }
    if let Some(sku) = raw.sku.as_deref().and_then(clean_sku) {
        identifiers.insert(Identifier::Sku {
            retailer: retailer.to_string(),
            value: sku,
        });
    }
    if identifiers.is_empty() {
        identifiers.insert(Identifier::Synthetic(format!(
            "{retailer}:{}",
            short_hash(url)
        )));
    }
    identifiers
}

/// Converts one raw record into a [`Deal`].
///
/// # Errors
///
/// Returns a [`NormalizationError`] when the title or URL is empty, the price
/// has no recoverable number, the currency has no configured USD rate, or the
/// record's sport or category label is not mapped for `source`.
pub fn normalize_record(
    raw: &RawRecord,
    source: &SourceConfig,
    config: &PipelineConfig,
) -> Result<Deal, NormalizationError> {
    let title = clean_text(&raw.title);
    if title.is_empty() {
        return Err(NormalizationError::EmptyTitle);
    }
    let url = canonical_url(&raw.url);
    if url.is_empty() {
        return Err(NormalizationError::MissingUrl);
    }

    let parsed = parse_price(&raw.price).ok_or_else(|| NormalizationError::UnparseablePrice {
        raw: raw.price.clone(),
    })?;
    // An explicit currency code beats the symbol; bare numbers are USD.
    let currency = raw
        .currency
        .as_deref()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .or_else(|| parsed.currency.map(str::to_string))
        .unwrap_or_else(|| "USD".to_string());
    let rate = config
        .usd_rate(&currency)
        .and_then(Decimal::from_f64)
        .filter(|r| *r > Decimal::ZERO)
        .ok_or_else(|| NormalizationError::UnsupportedCurrency {
            code: currency.clone(),
        })?;

    let price = to_usd_cents(parsed.amount, rate, &raw.price)?;
    let msrp = raw
        .msrp
        .as_deref()
        .and_then(|text| parse_price(text).map(|m| to_usd_cents(m.amount, rate, text)))
        .transpose()?
        .filter(|m| *m > Decimal::ZERO && *m >= price);
    let discount_pct = msrp.and_then(|m| Deal::discount_between(price, m));

    let sport = source
        .resolve_sport(raw.sport_label.as_deref())
        .ok_or_else(|| NormalizationError::UnmappedSport {
            label: raw.sport_label.clone(),
        })?;
    let category = source
        .resolve_category(raw.category_label.as_deref())
        .ok_or_else(|| NormalizationError::UnmappedCategory {
            label: raw.category_label.clone(),
        })?;

    let sizes = parse_sizes(&raw.sizes);
    let brand = non_empty(raw.brand.as_deref()).or_else(|| extract_brand_from_title(&title));
    let youth = classify_youth(
        &title,
        &sizes,
        raw.category_label.as_deref(),
        &source.youth_keywords,
        &config.youth,
    );

    let identifiers = collect_identifiers(raw, &source.retailer, &url);
    let strongest = identifiers
        .first()
        .map(Identifier::key)
        .unwrap_or_default();
    let deal_id = short_hash(&format!("{}|{strongest}", source.retailer));

    Ok(Deal {
        deal_id,
        source: source.id.clone(),
        title,
        brand,
        sport,
        category,
        price,
        msrp,
        discount_pct,
        identifiers,
        sizes,
        youth_flag: youth.youth_flag,
        age_band: youth.age_band,
        youth_evidence: youth.evidence,
        retailer: source.retailer.clone(),
        canonical_url: url,
        image_url: non_empty(raw.image_url.as_deref()),
        stock_level: stock_level(raw.availability.as_deref()),
        coupon_code: raw.promo_text.as_deref().and_then(extract_coupon),
        first_seen: raw.fetched_at,
        last_seen: raw.fetched_at,
    })
}

/// Normalizes every record of one source. Failures are collected as
/// [`DroppedRecord`]s; the batch never aborts.
#[must_use]
pub fn normalize_batch(
    records: &[RawRecord],
    source: &SourceConfig,
    config: &PipelineConfig,
) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for raw in records {
        match normalize_record(raw, source, config) {
            Ok(deal) => {
                tracing::debug!(
                    source = %source.id,
                    deal_id = %deal.deal_id,
                    youth = deal.youth_flag,
                    "record normalized"
                );
                batch.deals.push(deal);
            }
            Err(error) => {
                tracing::warn!(
                    source = %source.id,
                    url = %raw.url,
                    reason = error.reason(),
                    error = %error,
                    "dropping record"
                );
                batch.dropped.push(DroppedRecord {
                    url: raw.url.clone(),
                    title: raw.title.clone(),
                    error,
                });
            }
        }
    }
    tracing::info!(
        source = %source.id,
        normalized = batch.deals.len(),
        dropped = batch.dropped.len(),
        "source normalized"
    );
    batch
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
