//! One end-to-end run: fetch, normalize, dedup, rank.
//!
//! Source-level failures are absorbed into the [`RunSummary`]; only a bad
//! configuration or a run where no source succeeded is an error.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use ysdeals_core::{ConfigError, Deal, PipelineConfig, RankedEntry, RunSummary};
use ysdeals_scraper::{normalize_batch, FetchScheduler, SchedulerOptions, SourceAdapter};

use crate::dedup::{dedup, retailer_overlap, DedupStats};
use crate::rank::{digest_stats, DigestStats, Ranker};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "no source succeeded ({} attempted, {} failed)",
        .summary.sources_attempted,
        .summary.sources_failed
    )]
    NoSourceSucceeded { summary: Box<RunSummary> },
}

/// Everything a run hands to the rendering and persistence side.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub entries: Vec<RankedEntry>,
    /// Clusters formed before ranking filters and truncation.
    pub clusters_total: usize,
    pub dedup_stats: DedupStats,
    pub digest_stats: DigestStats,
    pub retailer_overlap: BTreeMap<String, BTreeSet<String>>,
    pub summary: RunSummary,
}

fn check_adapters(
    config: &PipelineConfig,
    adapters: &[Arc<dyn SourceAdapter>],
) -> Result<(), ConfigError> {
    config.validate()?;
    for adapter in adapters {
        if config.source(adapter.identifier()).is_none() {
            return Err(ConfigError::MissingSourceConfig(
                adapter.identifier().to_string(),
            ));
        }
    }
    Ok(())
}

/// Runs every adapter through the full pipeline.
///
/// Each source's records are normalized as soon as its report arrives;
/// deduplication and ranking wait for the complete batch.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] before any fetch if the configuration
/// is invalid or an adapter has no source entry, and
/// [`PipelineError::NoSourceSucceeded`] if every source failed.
pub async fn run_pipeline(
    config: &PipelineConfig,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    options: SchedulerOptions,
) -> Result<RunOutcome, PipelineError> {
    check_adapters(config, &adapters)?;

    let mut summary = RunSummary::new(Utc::now());
    summary.sources_attempted = adapters.len();
    tracing::info!(
        run_id = %summary.run_id,
        sources = summary.sources_attempted,
        "pipeline run started"
    );

    let mut run = FetchScheduler::new(options).start(adapters)?;
    let mut deals: Vec<Deal> = Vec::new();
    while let Some(report) = run.next_report().await {
        summary.record_source(report.summary());
        let Ok(records) = report.outcome else {
            continue;
        };
        // check_adapters guarantees the entry exists.
        let Some(source) = config.source(&report.source_id) else {
            continue;
        };
        let batch = normalize_batch(&records, source, config);
        for dropped in &batch.dropped {
            summary.record_drop(dropped.error.reason());
        }
        summary.deals_normalized += batch.deals.len();
        deals.extend(batch.deals);
    }

    if summary.sources_succeeded == 0 {
        summary.finish(Utc::now());
        tracing::error!(
            run_id = %summary.run_id,
            failed = summary.sources_failed,
            "no source succeeded, aborting run"
        );
        return Err(PipelineError::NoSourceSucceeded {
            summary: Box::new(summary),
        });
    }
    if summary.is_partial() {
        tracing::warn!(
            run_id = %summary.run_id,
            failed = summary.sources_failed,
            succeeded = summary.sources_succeeded,
            "partial run: some sources failed"
        );
    }

    let outcome = dedup(deals, &config.dedup);
    let overlap = retailer_overlap(&outcome.clusters);
    let clusters_total = outcome.clusters.len();
    summary.clusters_formed = clusters_total;

    let entries = Ranker::from_config(config).rank(outcome.clusters);
    summary.entries_ranked = entries.len();
    let stats = digest_stats(&entries);
    summary.finish(Utc::now());

    tracing::info!(
        run_id = %summary.run_id,
        fetched = summary.deals_fetched,
        normalized = summary.deals_normalized,
        dropped = summary.deals_dropped,
        clusters = summary.clusters_formed,
        ranked = summary.entries_ranked,
        "pipeline run complete"
    );

    Ok(RunOutcome {
        entries,
        clusters_total,
        dedup_stats: outcome.stats,
        digest_stats: stats,
        retailer_overlap: overlap,
        summary,
    })
}
