//! Shared domain types and configuration for the youth sports deal digest.
//!
//! Everything that crosses a crate boundary lives here: the raw and
//! canonical deal shapes, cluster and ranking outputs, the run summary, and
//! the already-parsed configuration structures the pipeline consumes.

pub mod app_config;
pub mod config;
pub mod deals;
pub mod digest;
pub mod error;
pub mod taxonomy;

pub use app_config::{load_app_config, load_app_config_from_env, AppConfig, Environment};
pub use config::{
    load_pipeline_config, AdapterConfig, BrandWeights, DedupThresholds, NumericRange,
    PipelineConfig, RankingOptions, ScoringWeights, SourceConfig, SourcePolicy, YouthConfig,
};
pub use deals::{Deal, Identifier, RawRecord};
pub use digest::{DealCluster, RankedEntry, RunSummary, SourceStatus, SourceSummary, SubScores};
pub use error::ConfigError;
pub use taxonomy::{AgeBand, Category, Sport, StockLevel, YouthEvidence};
