use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use ysdeals_core::{RawRecord, SourcePolicy};

use super::parse_listing;
use crate::adapter::SourceAdapter;
use crate::error::FetchError;

/// Fetches a listing with a single HTTP GET.
///
/// Status mapping: 429 is rate limiting (honoring a numeric `Retry-After`),
/// 5xx is a server error, any other non-2xx is a permanent client error.
pub struct JsonListingAdapter {
    client: Client,
    source_id: String,
    policy: SourcePolicy,
    url: String,
}

impl JsonListingAdapter {
    #[must_use]
    pub fn new(client: Client, source_id: &str, policy: SourcePolicy, url: &str) -> Self {
        Self {
            client,
            source_id: source_id.to_string(),
            policy,
            url: url.to_string(),
        }
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl SourceAdapter for JsonListingAdapter {
    fn identifier(&self) -> &str {
        &self.source_id
    }

    fn policy(&self) -> SourcePolicy {
        self.policy
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                retry_after: retry_after(&response),
            });
        }
        if status == StatusCode::REQUEST_TIMEOUT {
            return Err(FetchError::Timeout);
        }
        if status.is_server_error() {
            return Err(FetchError::ServerError {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::ClientError {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let records = parse_listing(&body, &self.source_id, Utc::now())?;
        tracing::debug!(
            source = %self.source_id,
            url = %self.url,
            records = records.len(),
            "listing fetched"
        );
        Ok(records)
    }
}
