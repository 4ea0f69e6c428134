//! Pipeline outputs: clusters, ranked entries, and the run summary handed to
//! the newsletter and persistence collaborators.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deals::Deal;
use crate::taxonomy::StockLevel;

/// Deals judged to be the same physical product across retailers.
///
/// `members` is never empty and `representative` always indexes into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealCluster {
    pub members: Vec<Deal>,
    pub representative: usize,
    /// Distinct retailers of non-representative members, sorted, excluding the
    /// representative's own retailer.
    pub alternate_retailers: Vec<String>,
}

impl DealCluster {
    #[must_use]
    pub fn representative(&self) -> &Deal {
        &self.members[self.representative]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Union of sizes across all members.
    #[must_use]
    pub fn merged_sizes(&self) -> BTreeSet<String> {
        self.members
            .iter()
            .flat_map(|d| d.sizes.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn first_seen(&self) -> DateTime<Utc> {
        self.members
            .iter()
            .map(|d| d.first_seen)
            .min()
            .unwrap_or_else(|| self.representative().first_seen)
    }

    #[must_use]
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.members
            .iter()
            .map(|d| d.last_seen)
            .max()
            .unwrap_or_else(|| self.representative().last_seen)
    }

    /// Most available stock level of any member.
    #[must_use]
    pub fn best_stock_level(&self) -> StockLevel {
        self.members
            .iter()
            .map(|d| d.stock_level)
            .min_by_key(|s| s.availability_rank())
            .unwrap_or(StockLevel::Out)
    }

    /// Representative's coupon, else the first member coupon by retailer name.
    #[must_use]
    pub fn coupon_code(&self) -> Option<&str> {
        if let Some(code) = self.representative().coupon_code.as_deref() {
            return Some(code);
        }
        let mut with_coupon: Vec<&Deal> = self
            .members
            .iter()
            .filter(|d| d.coupon_code.is_some())
            .collect();
        with_coupon.sort_by(|a, b| a.retailer.cmp(&b.retailer));
        with_coupon.first().and_then(|d| d.coupon_code.as_deref())
    }
}

/// Per-component scores, each in `[0, 1]`, kept for explainability.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub discount: f64,
    pub price: f64,
    pub brand: f64,
    pub youth: f64,
    pub inventory: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub cluster: DealCluster,
    pub score: f64,
    /// 1-based position within the entry's sport group.
    pub rank: u32,
    pub sub_scores: SubScores,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub source_id: String,
    pub status: SourceStatus,
    /// Total fetch attempts, including the first.
    pub attempts: u32,
    pub records: usize,
    pub error: Option<String>,
}

/// Per-stage counts for one run. Always produced, including on partial or
/// total source failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub sources_attempted: usize,
    pub sources_succeeded: usize,
    pub sources_failed: usize,
    pub deals_fetched: usize,
    pub deals_normalized: usize,
    pub deals_dropped: usize,
    /// Drop counts keyed by normalization failure reason.
    pub drop_reasons: BTreeMap<String, usize>,
    pub clusters_formed: usize,
    pub entries_ranked: usize,
    pub sources: Vec<SourceSummary>,
}

impl RunSummary {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: None,
            sources_attempted: 0,
            sources_succeeded: 0,
            sources_failed: 0,
            deals_fetched: 0,
            deals_normalized: 0,
            deals_dropped: 0,
            drop_reasons: BTreeMap::new(),
            clusters_formed: 0,
            entries_ranked: 0,
            sources: Vec::new(),
        }
    }

    pub fn record_source(&mut self, source: SourceSummary) {
        match source.status {
            SourceStatus::Succeeded => self.sources_succeeded += 1,
            SourceStatus::Failed => self.sources_failed += 1,
        }
        self.deals_fetched += source.records;
        self.sources.push(source);
    }

    pub fn record_drop(&mut self, reason: &str) {
        self.deals_dropped += 1;
        *self.drop_reasons.entry(reason.to_string()).or_default() += 1;
    }

    /// At least one source failed but the run still has data.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.sources_failed > 0 && self.sources_succeeded > 0
    }

    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.sources.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        self.finished_at = Some(at);
    }
}
