//! Built-in adapters for sources that publish a JSON listing of raw records.

mod file;
mod json_listing;
mod wire;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use ysdeals_core::{AdapterConfig, PipelineConfig, RawRecord};

use crate::adapter::SourceAdapter;
use crate::error::FetchError;

pub use file::FileAdapter;
pub use json_listing::JsonListingAdapter;

/// HTTP client settings shared by every `json_listing` source.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "ysdeals/0.1 (youth-sports-digest)".to_string(),
        }
    }
}

/// Builds the shared `reqwest` client.
///
/// # Errors
///
/// Returns [`FetchError::Network`] if the client cannot be constructed.
pub fn build_http_client(settings: &HttpSettings) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(settings.timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(settings.user_agent.as_str())
        .build()
        .map_err(|e| FetchError::Network(e.to_string()))
}

/// One adapter per configured source, in config order.
///
/// # Errors
///
/// Returns [`FetchError::Network`] if the HTTP client cannot be constructed.
pub fn adapters_from_config(
    config: &PipelineConfig,
    http: &HttpSettings,
) -> Result<Vec<Arc<dyn SourceAdapter>>, FetchError> {
    let mut client: Option<Client> = None;
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let adapter: Arc<dyn SourceAdapter> = match &source.adapter {
            AdapterConfig::JsonListing { url } => {
                let shared = match client.take() {
                    Some(c) => c,
                    None => build_http_client(http)?,
                };
                client = Some(shared.clone());
                Arc::new(JsonListingAdapter::new(shared, &source.id, source.policy, url))
            }
            AdapterConfig::File { path } => {
                Arc::new(FileAdapter::new(&source.id, source.policy, path))
            }
        };
        adapters.push(adapter);
    }
    Ok(adapters)
}

/// Parses a listing body into raw records stamped with `source_id` and
/// `fetched_at`.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the body is not a record array or an
/// `{ "items": [...] }` object.
pub fn parse_listing(
    body: &str,
    source_id: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<RawRecord>, FetchError> {
    let payload: wire::ListingPayload = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("listing from {source_id}: {e}")))?;
    Ok(payload
        .into_items()
        .into_iter()
        .map(|item| item.into_raw(source_id, fetched_at))
        .collect())
}
