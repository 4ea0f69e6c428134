use async_trait::async_trait;
use ysdeals_core::{RawRecord, SourcePolicy};

use crate::error::FetchError;

/// A retailer listing the scheduler can fetch.
///
/// Implementations perform exactly one request per `fetch` call. Rate
/// limiting and retries are the scheduler's job.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Source id; must match a `SourceConfig::id`.
    fn identifier(&self) -> &str;

    fn policy(&self) -> SourcePolicy;

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError>;
}
