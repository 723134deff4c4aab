//! Batch analysis - many subjects with bounded concurrency and fetch rate limits

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, sleep};

use crate::{
    model::{AnalysisReport, normalize_username},
    ports::{AnalysisStore, Clock, ProfileSource},
    usecases::analyze::AnalyzeUseCase,
};

/// Configuration for batch runs
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum analyses in flight
    pub max_concurrent: usize,
    /// Max fetches per minute (None = unlimited)
    pub rate_limit_per_minute: Option<u32>,
    /// Max fetches per hour (None = unlimited)
    pub rate_limit_per_hour: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            rate_limit_per_minute: None,
            rate_limit_per_hour: None,
        }
    }
}

/// Result for one subject of a batch
#[derive(Debug)]
pub enum BatchOutcome {
    Analyzed(Box<AnalysisReport>),
    Failed { error: String, transient: bool },
}

impl BatchOutcome {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Analyzed(report) => Some(report),
            Self::Failed { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct BatchEntry {
    /// Username as given in the input
    pub username: String,
    pub outcome: BatchOutcome,
}

/// Counts over a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub analyzed: usize,
    pub failed: usize,
    /// Analyzed subjects scoring at or above the flag threshold
    pub flagged: usize,
}

impl BatchSummary {
    pub fn from_entries(entries: &[BatchEntry], min_score: f64) -> Self {
        entries
            .iter()
            .fold(Self::default(), |mut acc, entry| match &entry.outcome {
                BatchOutcome::Analyzed(report) => {
                    acc.analyzed += 1;
                    if report.result.opportunity_score >= min_score {
                        acc.flagged += 1;
                    }
                    acc
                }
                BatchOutcome::Failed { .. } => {
                    acc.failed += 1;
                    acc
                }
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("No usernames to analyze")]
    NoUsernames,
}

/// Analyzes a list of subjects; per-subject failures are reported, not fatal
pub struct BatchAnalyzer<S, St, Cl>
where
    S: ProfileSource + ?Sized,
    St: AnalysisStore + ?Sized,
    Cl: Clock + ?Sized,
{
    usecase: Arc<AnalyzeUseCase<S, St, Cl>>,
    config: BatchConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl<S, St, Cl> BatchAnalyzer<S, St, Cl>
where
    S: ProfileSource + ?Sized,
    St: AnalysisStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(usecase: Arc<AnalyzeUseCase<S, St, Cl>>, config: BatchConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_per_minute,
            config.rate_limit_per_hour,
        ));
        Self {
            usecase,
            config,
            rate_limiter,
        }
    }

    /// Analyze every distinct username; results follow input order
    pub async fn run(&self, usernames: &[String]) -> Result<Vec<BatchEntry>, BatchError> {
        let usernames = dedupe(usernames);
        if usernames.is_empty() {
            return Err(BatchError::NoUsernames);
        }

        tracing::info!(
            count = usernames.len(),
            max_concurrent = self.config.max_concurrent,
            "Starting batch"
        );

        let max_concurrent = self.config.max_concurrent.max(1);
        let mut slots: Vec<Option<BatchOutcome>> = (0..usernames.len()).map(|_| None).collect();
        let mut tasks: FuturesUnordered<BoxFuture<'_, (usize, BatchOutcome)>> =
            FuturesUnordered::new();
        let mut pending = usernames.iter().enumerate();

        while tasks.len() < max_concurrent {
            let Some((index, username)) = pending.next() else {
                break;
            };
            tasks.push(self.spawn_one(index, username));
        }

        while let Some((index, outcome)) = tasks.next().await {
            slots[index] = Some(outcome);
            while tasks.len() < max_concurrent {
                let Some((index, username)) = pending.next() else {
                    break;
                };
                tasks.push(self.spawn_one(index, username));
            }
        }

        let entries = usernames
            .iter()
            .zip(slots)
            .filter_map(|(username, outcome)| {
                outcome.map(|outcome| BatchEntry {
                    username: username.clone(),
                    outcome,
                })
            })
            .collect();
        Ok(entries)
    }

    fn spawn_one<'a>(
        &'a self,
        index: usize,
        username: &'a str,
    ) -> BoxFuture<'a, (usize, BatchOutcome)> {
        let rate_limiter = Arc::clone(&self.rate_limiter);
        Box::pin(async move {
            rate_limiter.acquire().await;
            let outcome = match self.usecase.analyze_username(username).await {
                Ok(report) => BatchOutcome::Analyzed(Box::new(report)),
                Err(e) => {
                    tracing::warn!(username = %username, error = %e, "Analysis failed");
                    BatchOutcome::Failed {
                        error: e.to_string(),
                        transient: e.is_transient(),
                    }
                }
            };
            (index, outcome)
        })
    }
}

// First occurrence wins; comparison uses the normalized handle when it parses
fn dedupe(usernames: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    usernames
        .iter()
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .filter(|raw| {
            let key = normalize_username(raw).unwrap_or_else(|_| raw.to_string());
            seen.insert(key)
        })
        .map(String::from)
        .collect()
}

#[derive(Debug)]
struct RateLimiter {
    per_minute: Option<u32>,
    per_hour: Option<u32>,
    state: Mutex<RateLimiterState>,
}

#[derive(Debug)]
struct RateLimiterState {
    minute_window_start: Instant,
    hour_window_start: Instant,
    minute_count: u32,
    hour_count: u32,
}

impl RateLimiter {
    fn new(per_minute: Option<u32>, per_hour: Option<u32>) -> Self {
        let now = Instant::now();
        Self {
            per_minute,
            per_hour,
            state: Mutex::new(RateLimiterState {
                minute_window_start: now,
                hour_window_start: now,
                minute_count: 0,
                hour_count: 0,
            }),
        }
    }

    async fn acquire(&self) {
        if self.per_minute.is_none() && self.per_hour.is_none() {
            return;
        }

        loop {
            let mut state = self.state.lock().await;
            let now = Instant::now();

            if now.duration_since(state.minute_window_start) >= Duration::from_secs(60) {
                state.minute_window_start = now;
                state.minute_count = 0;
            }
            if now.duration_since(state.hour_window_start) >= Duration::from_secs(3600) {
                state.hour_window_start = now;
                state.hour_count = 0;
            }

            let minute_wait = self
                .per_minute
                .filter(|limit| state.minute_count >= *limit)
                .map(|_| {
                    Duration::from_secs(60)
                        .saturating_sub(now.duration_since(state.minute_window_start))
                });
            let hour_wait = self
                .per_hour
                .filter(|limit| state.hour_count >= *limit)
                .map(|_| {
                    Duration::from_secs(3600)
                        .saturating_sub(now.duration_since(state.hour_window_start))
                });
            let wait_for = minute_wait
                .into_iter()
                .chain(hour_wait)
                .max()
                .unwrap_or_default();

            if wait_for.is_zero() {
                state.minute_count = state.minute_count.saturating_add(1);
                state.hour_count = state.hour_count.saturating_add(1);
                return;
            }

            tracing::debug!(wait_ms = wait_for.as_millis() as u64, "Rate limit reached, waiting");
            drop(state);
            sleep(wait_for).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Analyzer;
    use crate::usecases::testing::{FakeClock, FakeSource, FakeStore, NOW, sample_snapshot};

    fn batch(
        source: FakeSource,
        config: BatchConfig,
    ) -> BatchAnalyzer<FakeSource, FakeStore, FakeClock> {
        let usecase = AnalyzeUseCase::new(
            Arc::new(source),
            Arc::new(FakeStore::default()),
            Arc::new(FakeClock { time: NOW }),
            Analyzer::default(),
        );
        BatchAnalyzer::new(Arc::new(usecase), config)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_results_preserve_input_order_and_isolate_failures() {
        let mut source = FakeSource::with(vec![
            sample_snapshot("alpha", 2450),
            sample_snapshot("gamma", 50_000),
        ]);
        source.delay = Some(std::time::Duration::from_millis(5));
        let batch = batch(source, BatchConfig::default());

        let entries = batch
            .run(&names(&["alpha", "missing", "gamma", "bad handle!"]))
            .await
            .unwrap();

        let order: Vec<&str> = entries.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(order, vec!["alpha", "missing", "gamma", "bad handle!"]);
        assert!(entries[0].outcome.report().is_some());
        assert!(matches!(
            entries[1].outcome,
            BatchOutcome::Failed { transient: false, .. }
        ));
        assert!(entries[2].outcome.report().is_some());
        assert!(matches!(entries[3].outcome, BatchOutcome::Failed { .. }));

        let summary = BatchSummary::from_entries(&entries, 7.5);
        assert_eq!(
            summary,
            BatchSummary {
                analyzed: 2,
                failed: 2,
                flagged: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_duplicates_are_analyzed_once() {
        let source = Arc::new(FakeSource::with(vec![sample_snapshot("alpha", 2450)]));
        let usecase = AnalyzeUseCase::new(
            Arc::clone(&source),
            Arc::new(FakeStore::default()),
            Arc::new(FakeClock { time: NOW }),
            Analyzer::default(),
        );
        let batch = BatchAnalyzer::new(Arc::new(usecase), BatchConfig::default());

        let entries = batch
            .run(&names(&["alpha", "@ALPHA", " alpha "]))
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(source.calls(), vec!["alpha".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_input_is_an_error() {
        let batch = batch(FakeSource::default(), BatchConfig::default());
        let err = batch.run(&names(&["", "  "])).await.unwrap_err();
        assert!(matches!(err, BatchError::NoUsernames));
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_makes_progress() {
        let source = FakeSource::with(vec![sample_snapshot("alpha", 2450)]);
        let batch = batch(
            source,
            BatchConfig {
                max_concurrent: 0,
                ..Default::default()
            },
        );

        let entries = batch.run(&names(&["alpha"])).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_waits_for_next_window() {
        let limiter = RateLimiter::new(Some(2), None);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[test]
    fn test_dedupe_keeps_first_spelling() {
        assert_eq!(
            dedupe(&names(&["Alpha", "alpha", "beta", "", "@BETA"])),
            names(&["Alpha", "beta"])
        );
    }
}
