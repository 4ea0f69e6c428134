use std::time::Duration;

use thiserror::Error;

/// Failure of a single adapter fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("server error: HTTP {status}")]
    ServerError { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("client error: HTTP {status}")]
    ClientError { status: u16 },

    /// The response no longer has the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("failed to read listing at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("source task ended without reporting: {0}")]
    Aborted(String),
}

impl FetchError {
    /// Timeouts, 429s, 5xx responses, and connection failures are transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout
                | FetchError::RateLimited { .. }
                | FetchError::ServerError { .. }
                | FetchError::Network(_)
        )
    }

    /// Server-requested minimum wait before the next attempt.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            if status.is_server_error() {
                FetchError::ServerError {
                    status: status.as_u16(),
                }
            } else {
                FetchError::ClientError {
                    status: status.as_u16(),
                }
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Why a raw record could not become a deal. The record is dropped; the
/// batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("record has an empty title")]
    EmptyTitle,

    #[error("record has no listing URL")]
    MissingUrl,

    #[error("no numeric value in price {raw:?}")]
    UnparseablePrice { raw: String },

    #[error("price {raw:?} is out of range after currency conversion")]
    PriceOutOfRange { raw: String },

    #[error("unsupported currency {code}")]
    UnsupportedCurrency { code: String },

    #[error("no sport mapping for label {label:?}")]
    UnmappedSport { label: Option<String> },

    #[error("no category mapping for label {label:?}")]
    UnmappedCategory { label: Option<String> },
}

impl NormalizationError {
    /// Stable key used for per-reason drop counts.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            NormalizationError::EmptyTitle => "empty_title",
            NormalizationError::MissingUrl => "missing_url",
            NormalizationError::UnparseablePrice { .. } => "unparseable_price",
            NormalizationError::PriceOutOfRange { .. } => "price_out_of_range",
            NormalizationError::UnsupportedCurrency { .. } => "unsupported_currency",
            NormalizationError::UnmappedSport { .. } => "unmapped_sport",
            NormalizationError::UnmappedCategory { .. } => "unmapped_category",
        }
    }
}
