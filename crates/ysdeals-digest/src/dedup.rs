//! Cross-retailer identity resolution.
//!
//! Deals are joined in a union-find over their batch index whenever any one
//! signal holds: the same GTIN, the same MPN under the same brand, or a fuzzy
//! match (title similarity, same brand, same sport, price within tolerance).
//! Candidates for each signal are bucketed first so only deals sharing a key
//! are ever compared.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ysdeals_core::{Deal, DealCluster, DedupThresholds, Sport};

use crate::similarity::{dice, price_within, title_tokens};
use crate::union_find::UnionFind;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DedupStats {
    pub total_deals: usize,
    pub clusters: usize,
    /// Clusters with more than one member.
    pub duplicate_groups: usize,
    /// Deals folded into another deal's cluster.
    pub duplicates_merged: usize,
    /// `duplicates_merged / total_deals` as a percentage, one decimal place.
    pub dedup_rate: f64,
}

impl DedupStats {
    fn from_clusters(total_deals: usize, clusters: &[DealCluster]) -> Self {
        let duplicate_groups = clusters.iter().filter(|c| c.len() > 1).count();
        let duplicates_merged = total_deals - clusters.len();
        #[allow(clippy::cast_precision_loss)]
        let dedup_rate = if total_deals == 0 {
            0.0
        } else {
            (duplicates_merged as f64 / total_deals as f64 * 1000.0).round() / 10.0
        };
        Self {
            total_deals,
            clusters: clusters.len(),
            duplicate_groups,
            duplicates_merged,
            dedup_rate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// Ordered by representative `deal_id`.
    pub clusters: Vec<DealCluster>,
    pub stats: DedupStats,
}

fn brand_key(deal: &Deal) -> Option<String> {
    deal.brand
        .as_deref()
        .map(|b| b.trim().to_uppercase())
        .filter(|b| !b.is_empty())
}

/// Joins every index in each bucket to the bucket's first index.
fn join_buckets<K: Ord>(uf: &mut UnionFind, buckets: BTreeMap<K, Vec<usize>>) -> usize {
    let mut joins = 0;
    for members in buckets.values() {
        if let Some((&first, rest)) = members.split_first() {
            for &other in rest {
                if uf.union(first, other) {
                    joins += 1;
                }
            }
        }
    }
    joins
}

fn link_identifiers(uf: &mut UnionFind, deals: &[Deal]) {
    let mut by_gtin: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    let mut by_mpn: BTreeMap<(&str, String), Vec<usize>> = BTreeMap::new();
    for (i, deal) in deals.iter().enumerate() {
        if let Some(gtin) = deal.gtin() {
            by_gtin.entry(gtin).or_default().push(i);
        }
        if let (Some(mpn), Some(brand)) = (deal.mpn(), brand_key(deal)) {
            by_mpn.entry((mpn, brand)).or_default().push(i);
        }
    }
    let gtin_joins = join_buckets(uf, by_gtin);
    let mpn_joins = join_buckets(uf, by_mpn);
    tracing::debug!(gtin_joins, mpn_joins, "identifier signals applied");
}

fn link_fuzzy(uf: &mut UnionFind, deals: &[Deal], thresholds: &DedupThresholds) {
    let mut buckets: BTreeMap<(String, Sport), Vec<usize>> = BTreeMap::new();
    for (i, deal) in deals.iter().enumerate() {
        if let Some(brand) = brand_key(deal) {
            buckets.entry((brand, deal.sport)).or_default().push(i);
        }
    }

    let mut joins = 0usize;
    for members in buckets.values().filter(|m| m.len() > 1) {
        let tokens: Vec<BTreeSet<String>> = members
            .iter()
            .map(|&i| title_tokens(&deals[i].title, deals[i].brand.as_deref()))
            .collect();
        for (a, &i) in members.iter().enumerate() {
            for (b, &j) in members.iter().enumerate().skip(a + 1) {
                if price_within(deals[i].price, deals[j].price, thresholds.price_tolerance)
                    && dice(&tokens[a], &tokens[b]) >= thresholds.title_similarity
                    && uf.union(i, j)
                {
                    joins += 1;
                }
            }
        }
    }
    tracing::debug!(
        buckets = buckets.len(),
        fuzzy_joins = joins,
        "fuzzy title signal applied"
    );
}

/// Lowest price, then highest discount, then smallest retailer name, then
/// smallest `deal_id`.
fn representative_order(a: &Deal, b: &Deal) -> Ordering {
    a.price
        .cmp(&b.price)
        .then_with(|| b.discount_pct.cmp(&a.discount_pct))
        .then_with(|| a.retailer.cmp(&b.retailer))
        .then_with(|| a.deal_id.cmp(&b.deal_id))
        .then_with(|| a.canonical_url.cmp(&b.canonical_url))
}

fn build_cluster(mut members: Vec<Deal>) -> DealCluster {
    members.sort_by(representative_order);
    let representative_retailer = members[0].retailer.clone();
    let alternate_retailers: BTreeSet<String> = members[1..]
        .iter()
        .map(|d| d.retailer.clone())
        .filter(|r| *r != representative_retailer)
        .collect();
    DealCluster {
        members,
        representative: 0,
        alternate_retailers: alternate_retailers.into_iter().collect(),
    }
}

/// Partitions a full batch into clusters of the same physical product.
///
/// Matching is transitive: if A joins B and B joins C, all three share a
/// cluster. Output is a pure function of the deal set; input order does not
/// affect membership, representatives or cluster order.
#[must_use]
pub fn dedup(deals: Vec<Deal>, thresholds: &DedupThresholds) -> DedupOutcome {
    let total = deals.len();
    let mut uf = UnionFind::new(total);
    link_identifiers(&mut uf, &deals);
    link_fuzzy(&mut uf, &deals, thresholds);

    let groups = uf.groups();
    let mut slots: Vec<Option<Deal>> = deals.into_iter().map(Some).collect();
    let mut clusters: Vec<DealCluster> = groups
        .into_iter()
        .map(|group| {
            let members: Vec<Deal> = group.into_iter().filter_map(|i| slots[i].take()).collect();
            build_cluster(members)
        })
        .collect();
    clusters.sort_by(|a, b| {
        let (ra, rb) = (a.representative(), b.representative());
        ra.deal_id
            .cmp(&rb.deal_id)
            .then_with(|| representative_order(ra, rb))
    });

    let stats = DedupStats::from_clusters(total, &clusters);
    tracing::info!(
        deals = stats.total_deals,
        clusters = stats.clusters,
        duplicates_merged = stats.duplicates_merged,
        "deduplication complete"
    );
    DedupOutcome { clusters, stats }
}

/// Retailer → other retailers it shares at least one cluster with.
#[must_use]
pub fn retailer_overlap(clusters: &[DealCluster]) -> BTreeMap<String, BTreeSet<String>> {
    let mut overlap: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for cluster in clusters.iter().filter(|c| c.len() > 1) {
        let retailers: BTreeSet<&str> =
            cluster.members.iter().map(|d| d.retailer.as_str()).collect();
        for &retailer in &retailers {
            let others = retailers
                .iter()
                .filter(|r| **r != retailer)
                .map(|r| (*r).to_string());
            overlap.entry(retailer.to_string()).or_default().extend(others);
        }
    }
    overlap.retain(|_, others| !others.is_empty());
    overlap
}

#[cfg(test)]
#[path = "dedup_test.rs"]
mod tests;
