use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use ysdeals_core::{RawRecord, SourcePolicy};

use super::parse_listing;
use crate::adapter::SourceAdapter;
use crate::error::FetchError;

/// Reads a listing exported to disk, e.g. by an out-of-process scraper.
pub struct FileAdapter {
    source_id: String,
    policy: SourcePolicy,
    path: PathBuf,
}

impl FileAdapter {
    #[must_use]
    pub fn new(source_id: &str, policy: SourcePolicy, path: &Path) -> Self {
        Self {
            source_id: source_id.to_string(),
            policy,
            path: path.to_path_buf(),
        }
    }
}

#[async_trait]
impl SourceAdapter for FileAdapter {
    fn identifier(&self) -> &str {
        &self.source_id
    }

    fn policy(&self) -> SourcePolicy {
        self.policy
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Io {
                path: self.path.display().to_string(),
                source: e,
            })?;
        parse_listing(&body, &self.source_id, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_permanent_io_error() {
        let adapter = FileAdapter::new(
            "disk",
            SourcePolicy::default(),
            Path::new("/nonexistent/listing.json"),
        );
        let err = adapter.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }), "got {err:?}");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn reads_listing_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "ysdeals-file-adapter-{}.json",
            std::process::id()
        ));
        tokio::fs::write(
            &path,
            r#"{"items":[{"url":"https://x.example/1","title":"Junior Stick","price":"$49.99"}]}"#,
        )
        .await
        .unwrap();

        let adapter = FileAdapter::new("disk", SourcePolicy::default(), &path);
        let records = adapter.fetch().await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Junior Stick");
        assert_eq!(records[0].source, "disk");
    }
}
