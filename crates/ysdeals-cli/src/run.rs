//! `run` and `check-config` handlers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use ysdeals_core::{AppConfig, PipelineConfig, RankingOptions};
use ysdeals_digest::{run_pipeline, PipelineError, RunOutcome};
use ysdeals_scraper::{adapters_from_config, HttpSettings, SchedulerOptions};

/// Command-line overrides for one `run`.
#[derive(Debug, Default)]
pub(crate) struct RunArgs {
    pub config: Option<PathBuf>,
    pub youth_only: bool,
    pub top_per_sport: Option<usize>,
    pub min_discount: Option<f64>,
    pub output: Option<PathBuf>,
}

impl RunArgs {
    /// Flags win over the config file; an absent flag leaves it untouched.
    pub(crate) fn apply(&self, ranking: &mut RankingOptions) {
        if self.youth_only {
            ranking.youth_only = true;
        }
        if let Some(n) = self.top_per_sport {
            ranking.top_per_sport = Some(n);
        }
        if let Some(min) = self.min_discount {
            ranking.min_discount = min;
        }
    }
}

fn load_config(app: &AppConfig, path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let path = path.unwrap_or(app.config_path.as_path());
    ysdeals_core::load_pipeline_config(path)
        .with_context(|| format!("loading pipeline config from {}", path.display()))
}

pub(crate) fn check_config(app: &AppConfig, path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(app, path)?;
    println!("config ok: {} source(s)", config.sources.len());
    for source in &config.sources {
        println!(
            "  {} ({}) {} rpm, burst {}, {} retries",
            source.id,
            source.retailer,
            source.policy.requests_per_minute,
            source.policy.burst,
            source.policy.max_retries
        );
    }
    Ok(())
}

/// Runs the pipeline once and hands the digest off as JSON.
///
/// # Errors
///
/// Fails on configuration problems, when no source succeeds, or when the
/// digest cannot be written.
pub(crate) async fn run_digest(app: &AppConfig, args: RunArgs) -> anyhow::Result<()> {
    let mut config = load_config(app, args.config.as_deref())?;
    args.apply(&mut config.ranking);

    let http = HttpSettings {
        timeout: Duration::from_secs(app.http_timeout_secs),
        user_agent: app.user_agent.clone(),
    };
    let adapters = adapters_from_config(&config, &http).context("building source adapters")?;
    let options = SchedulerOptions {
        run_timeout: Duration::from_secs(app.run_timeout_secs),
        max_backoff: Duration::from_millis(app.max_backoff_ms),
    };

    let outcome = match run_pipeline(&config, adapters, options).await {
        Ok(outcome) => outcome,
        Err(PipelineError::NoSourceSucceeded { summary }) => {
            for source in &summary.sources {
                tracing::error!(
                    source = %source.source_id,
                    attempts = source.attempts,
                    error = source.error.as_deref().unwrap_or("unknown"),
                    "source failed"
                );
            }
            anyhow::bail!(
                "run {} failed: none of {} sources succeeded",
                summary.run_id,
                summary.sources_attempted
            );
        }
        Err(e) => return Err(e).context("pipeline run failed"),
    };

    write_digest(&outcome, args.output.as_deref()).await?;
    tracing::info!(
        run_id = %outcome.summary.run_id,
        entries = outcome.entries.len(),
        failed_sources = outcome.summary.sources_failed,
        "digest written"
    );
    Ok(())
}

pub(crate) async fn write_digest(
    outcome: &RunOutcome,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(outcome).context("serializing digest")?;
    match output {
        Some(path) => write_atomically(path, &json).await,
        None => {
            println!("{}", String::from_utf8_lossy(&json));
            Ok(())
        }
    }
}

/// Writes to a sibling temp file, then renames over `path`, so readers
/// never observe a partial digest.
pub(crate) async fn write_atomically(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let mut tmp_name = path
        .file_name()
        .with_context(|| format!("output path {} has no file name", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("moving digest into {}", path.display()));
    }
    Ok(())
}
