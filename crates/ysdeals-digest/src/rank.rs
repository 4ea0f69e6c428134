//! Filtering, ordering and per-sport grouping of scored clusters.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ysdeals_core::{
    BrandWeights, Category, DealCluster, PipelineConfig, RankedEntry, RankingOptions,
    ScoringWeights, Sport, StockLevel,
};

use crate::scorer::{score_cluster, PriceRange};

/// Turns clusters into the ordered, group-truncated digest.
#[derive(Debug, Clone)]
pub struct Ranker<'a> {
    brands: &'a BrandWeights,
    weights: &'a ScoringWeights,
    options: RankingOptions,
}

impl<'a> Ranker<'a> {
    #[must_use]
    pub fn new(
        brands: &'a BrandWeights,
        weights: &'a ScoringWeights,
        options: RankingOptions,
    ) -> Self {
        Self {
            brands,
            weights,
            options,
        }
    }

    #[must_use]
    pub fn from_config(config: &'a PipelineConfig) -> Self {
        Self::new(&config.brands, &config.scoring, config.ranking)
    }

    fn eligible(&self, cluster: &DealCluster) -> bool {
        let rep = cluster.representative();
        rep.discount_fraction() >= self.options.min_discount
            && (!self.options.youth_only || rep.youth_flag)
            && (!self.options.in_stock_only || rep.stock_level != StockLevel::Out)
    }

    /// Scores and orders `clusters`.
    ///
    /// Entries come out grouped by sport in taxonomy order. Within a group
    /// the order is score descending, then discount descending, then earliest
    /// `last_seen`, then smallest `deal_id`; `rank` counts from 1 per group.
    #[must_use]
    pub fn rank(&self, clusters: Vec<DealCluster>) -> Vec<RankedEntry> {
        let total = clusters.len();
        let eligible: Vec<DealCluster> = clusters
            .into_iter()
            .filter(|c| self.eligible(c))
            .collect();

        let mut ranges: BTreeMap<(Sport, Category), PriceRange> = BTreeMap::new();
        for cluster in &eligible {
            let rep = cluster.representative();
            ranges
                .entry((rep.sport, rep.category))
                .and_modify(|r| r.include(rep.price))
                .or_insert_with(|| PriceRange::of(rep.price));
        }

        let mut scored: Vec<RankedEntry> = eligible
            .into_iter()
            .map(|cluster| {
                let rep = cluster.representative();
                let range = ranges
                    .get(&(rep.sport, rep.category))
                    .copied()
                    .unwrap_or_else(|| PriceRange::of(rep.price));
                let (score, sub_scores) =
                    score_cluster(&cluster, range, self.brands, self.weights);
                RankedEntry {
                    cluster,
                    score,
                    rank: 0,
                    sub_scores,
                }
            })
            .collect();
        scored.sort_by(entry_order);

        let mut entries = Vec::with_capacity(scored.len());
        let mut current: Option<Sport> = None;
        let mut position = 0u32;
        for mut entry in scored {
            let sport = entry.cluster.representative().sport;
            if current != Some(sport) {
                current = Some(sport);
                position = 0;
            }
            if self
                .options
                .top_per_sport
                .is_some_and(|cap| position as usize >= cap)
            {
                continue;
            }
            position += 1;
            entry.rank = position;
            entries.push(entry);
        }

        tracing::info!(
            clusters = total,
            ranked = entries.len(),
            youth_only = self.options.youth_only,
            "ranking complete"
        );
        entries
    }
}

fn entry_order(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    let (ra, rb) = (a.cluster.representative(), b.cluster.representative());
    ra.sport
        .cmp(&rb.sport)
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| rb.discount_pct.cmp(&ra.discount_pct))
        .then_with(|| ra.last_seen.cmp(&rb.last_seen))
        .then_with(|| ra.deal_id.cmp(&rb.deal_id))
}

/// Headline numbers for the digest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DigestStats {
    pub entries: usize,
    pub youth_entries: usize,
    pub in_stock_entries: usize,
    pub coupon_entries: usize,
    /// Mean discount over entries that have one, as a percentage.
    pub avg_discount_pct: f64,
    pub avg_price: Decimal,
    pub top_sports: Vec<(Sport, usize)>,
    pub top_brands: Vec<(String, usize)>,
    pub top_retailers: Vec<(String, usize)>,
}

fn top_five<K: Ord>(counts: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut counted: Vec<(K, usize)> = counts.into_iter().collect();
    // Stable sort keeps key order among equal counts.
    counted.sort_by(|a, b| b.1.cmp(&a.1));
    counted.truncate(5);
    counted
}

/// Mean of a non-empty slice. Falls back to summing `v / n` when the plain
/// total would overflow.
fn mean(values: &[Decimal]) -> Decimal {
    let n = Decimal::from(values.len());
    values
        .iter()
        .try_fold(Decimal::ZERO, |total, v| total.checked_add(*v))
        .map_or_else(|| values.iter().map(|v| *v / n).sum::<Decimal>(), |total| total / n)
}

#[must_use]
pub fn digest_stats(entries: &[RankedEntry]) -> DigestStats {
    if entries.is_empty() {
        return DigestStats::default();
    }

    let reps: Vec<_> = entries.iter().map(|e| e.cluster.representative()).collect();
    let discounts: Vec<Decimal> = reps.iter().filter_map(|d| d.discount_pct).collect();
    let avg_discount_pct = if discounts.is_empty() {
        0.0
    } else {
        (mean(&discounts) * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or(0.0)
    };
    let prices: Vec<Decimal> = reps.iter().map(|d| d.price).collect();
    let avg_price =
        mean(&prices).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let mut sports = BTreeMap::new();
    let mut brands = BTreeMap::new();
    let mut retailers = BTreeMap::new();
    for rep in &reps {
        *sports.entry(rep.sport).or_insert(0) += 1;
        if let Some(brand) = rep.brand.as_deref() {
            *brands.entry(brand.to_string()).or_insert(0) += 1;
        }
        *retailers.entry(rep.retailer.clone()).or_insert(0) += 1;
    }

    DigestStats {
        entries: entries.len(),
        youth_entries: reps.iter().filter(|d| d.youth_flag).count(),
        in_stock_entries: reps
            .iter()
            .filter(|d| d.stock_level != StockLevel::Out)
            .count(),
        coupon_entries: entries
            .iter()
            .filter(|e| e.cluster.coupon_code().is_some())
            .count(),
        avg_discount_pct,
        avg_price,
        top_sports: top_five(sports),
        top_brands: top_five(brands),
        top_retailers: top_five(retailers),
    }
}

#[cfg(test)]
#[path = "rank_test.rs"]
mod tests;
