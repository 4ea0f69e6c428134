//! Concurrent fetch orchestration.
//!
//! Each source runs in its own task, serialized by its own limiter, and posts
//! a single [`SourceReport`] back over an mpsc channel. The consumer sees
//! reports in completion order. Sources still running at the run deadline are
//! aborted and reported as failed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use ysdeals_core::{ConfigError, RawRecord, SourceStatus, SourceSummary};

use crate::adapter::SourceAdapter;
use crate::error::FetchError;
use crate::rate_limit::{retry_with_backoff, SourceLimiter};

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// Whole-run deadline, measured from [`FetchScheduler::start`].
    pub run_timeout: Duration,
    pub max_backoff: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_secs(300),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Final status of one source for this run.
#[derive(Debug)]
pub struct SourceReport {
    pub source_id: String,
    /// Total fetch attempts, including the first.
    pub attempts: u32,
    pub outcome: Result<Vec<RawRecord>, FetchError>,
}

impl SourceReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    #[must_use]
    pub fn summary(&self) -> SourceSummary {
        match &self.outcome {
            Ok(records) => SourceSummary {
                source_id: self.source_id.clone(),
                status: SourceStatus::Succeeded,
                attempts: self.attempts,
                records: records.len(),
                error: None,
            },
            Err(e) => SourceSummary {
                source_id: self.source_id.clone(),
                status: SourceStatus::Failed,
                attempts: self.attempts,
                records: 0,
                error: Some(e.to_string()),
            },
        }
    }
}

struct PendingSource {
    source_id: String,
    attempts: Arc<AtomicU32>,
}

impl PendingSource {
    fn failed(self, err: FetchError) -> SourceReport {
        SourceReport {
            source_id: self.source_id,
            attempts: self.attempts.load(Ordering::SeqCst),
            outcome: Err(err),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchScheduler {
    options: SchedulerOptions,
}

impl FetchScheduler {
    #[must_use]
    pub fn new(options: SchedulerOptions) -> Self {
        Self { options }
    }

    /// Spawns one task per adapter and returns a handle yielding their
    /// reports.
    ///
    /// Limiters are built before anything is spawned, so an invalid policy
    /// fails the whole run without touching any source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any adapter's policy has a zero rate or burst.
    pub fn start(
        &self,
        adapters: Vec<Arc<dyn SourceAdapter>>,
    ) -> Result<ScheduledRun, ConfigError> {
        let limiters = adapters
            .iter()
            .map(|a| SourceLimiter::new(a.identifier(), &a.policy()))
            .collect::<Result<Vec<_>, _>>()?;

        let (tx, rx) = mpsc::channel(adapters.len().max(1));
        let mut tasks = JoinSet::new();
        let mut pending = BTreeMap::new();
        let max_backoff = self.options.max_backoff;

        for (index, (adapter, limiter)) in adapters.into_iter().zip(limiters).enumerate() {
            let attempts = Arc::new(AtomicU32::new(0));
            pending.insert(
                index,
                PendingSource {
                    source_id: adapter.identifier().to_string(),
                    attempts: Arc::clone(&attempts),
                },
            );
            let tx = tx.clone();
            tasks.spawn(async move {
                let report = run_source(adapter, limiter, max_backoff, attempts).await;
                // The receiver is gone only if the run was dropped.
                let _ = tx.send((index, report)).await;
            });
        }

        Ok(ScheduledRun {
            rx,
            tasks,
            pending,
            deadline: Instant::now() + self.options.run_timeout,
            expired: false,
        })
    }
}

async fn run_source(
    adapter: Arc<dyn SourceAdapter>,
    limiter: SourceLimiter,
    max_backoff: Duration,
    attempts: Arc<AtomicU32>,
) -> SourceReport {
    let source: &dyn SourceAdapter = adapter.as_ref();
    let policy = source.policy();
    let outcome =
        retry_with_backoff(&limiter, &policy, max_backoff, &attempts, move || source.fetch()).await;
    let attempts = attempts.load(Ordering::SeqCst);

    match &outcome {
        Ok(records) => tracing::info!(
            source = %source.identifier(),
            records = records.len(),
            attempts,
            "source fetch complete"
        ),
        Err(e) => tracing::error!(
            source = %source.identifier(),
            attempts,
            error = %e,
            "source fetch failed, excluding from run"
        ),
    }

    SourceReport {
        source_id: source.identifier().to_string(),
        attempts,
        outcome,
    }
}

/// In-flight fetches for one run.
///
/// Dropping this aborts any source still running.
pub struct ScheduledRun {
    rx: mpsc::Receiver<(usize, SourceReport)>,
    tasks: JoinSet<()>,
    pending: BTreeMap<usize, PendingSource>,
    deadline: Instant,
    expired: bool,
}

impl ScheduledRun {
    /// Number of sources that have not reported yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Next report in completion order, or `None` once every source has
    /// reported. After the deadline, remaining sources are yielded as failed
    /// with [`FetchError::DeadlineExceeded`].
    pub async fn next_report(&mut self) -> Option<SourceReport> {
        if self.pending.is_empty() {
            return None;
        }

        if !self.expired {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some((index, report)) => {
                        self.pending.remove(&index);
                        return Some(report);
                    }
                    None => {
                        // Every sender dropped without reporting: the tasks panicked.
                        let (_, source) = self.pending.pop_first()?;
                        tracing::error!(
                            source = %source.source_id,
                            "source task ended without a report"
                        );
                        return Some(source.failed(FetchError::Aborted(
                            "task panicked".to_string(),
                        )));
                    }
                },
                () = tokio::time::sleep_until(self.deadline) => {
                    self.expired = true;
                    self.tasks.abort_all();
                    tracing::warn!(
                        pending = self.pending.len(),
                        "run deadline reached, aborting pending sources"
                    );
                }
            }
        }

        // Reports that landed before the abort still count.
        if let Ok((index, report)) = self.rx.try_recv() {
            if self.pending.remove(&index).is_some() {
                return Some(report);
            }
        }

        let (_, source) = self.pending.pop_first()?;
        tracing::error!(source = %source.source_id, "source exceeded run deadline");
        Some(source.failed(FetchError::DeadlineExceeded))
    }

    /// Drains every remaining report.
    pub async fn collect(mut self) -> Vec<SourceReport> {
        let mut reports = Vec::with_capacity(self.pending.len());
        while let Some(report) = self.next_report().await {
            reports.push(report);
        }
        reports
    }
}
