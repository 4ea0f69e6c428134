//! Fetching and normalization for retailer deal listings.
//!
//! Adapters implement [`SourceAdapter`]; the [`FetchScheduler`] drives them
//! under per-source rate limits and retry policy, and [`normalize_record`]
//! turns each [`ysdeals_core::RawRecord`] into a canonical
//! [`ysdeals_core::Deal`].

pub mod adapter;
pub mod error;
pub mod listing;
pub mod normalize;
pub mod parse;
pub mod rate_limit;
pub mod scheduler;
pub mod youth;

pub use adapter::SourceAdapter;
pub use error::{FetchError, NormalizationError};
pub use listing::{adapters_from_config, FileAdapter, HttpSettings, JsonListingAdapter};
pub use normalize::{normalize_batch, normalize_record, DroppedRecord, NormalizedBatch};
pub use rate_limit::{retry_with_backoff, SourceLimiter};
pub use scheduler::{FetchScheduler, ScheduledRun, SchedulerOptions, SourceReport};
pub use youth::{classify_youth, YouthClassification};
