//! Cross-retailer deduplication, scoring and ranking, plus the coordinator
//! that drives a whole run.

pub mod dedup;
pub mod pipeline;
pub mod rank;
pub mod scorer;
pub mod similarity;
mod union_find;

#[cfg(test)]
mod test_support;

pub use dedup::{dedup, retailer_overlap, DedupOutcome, DedupStats};
pub use pipeline::{run_pipeline, PipelineError, RunOutcome};
pub use rank::{digest_stats, DigestStats, Ranker};
pub use scorer::{score_cluster, PriceRange};
