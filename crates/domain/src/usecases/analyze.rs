//! Analyze use case - fetch, look up the prior result, analyze, persist

use std::sync::Arc;

use time::Duration;

use crate::{
    engine::{Analyzer, compare},
    model::{AnalysisReport, ProfileSnapshot, SnapshotError, normalize_username},
    ports::{AnalysisStore, Clock, ProfileSource, ProfileSourceError, StoreError},
};

/// Errors from a single analysis
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("Profile source error: {0}")]
    Source(#[from] ProfileSourceError),
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AnalyzeError {
    /// Whether a later retry could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Source(e) => e.is_transient(),
            Self::Snapshot(_) => false,
            Self::Store(_) => true,
        }
    }
}

/// Runs the engine between a profile source and an analysis store
pub struct AnalyzeUseCase<S, St, Cl>
where
    S: ProfileSource + ?Sized,
    St: AnalysisStore + ?Sized,
    Cl: Clock + ?Sized,
{
    source: Arc<S>,
    store: Arc<St>,
    clock: Arc<Cl>,
    analyzer: Analyzer,
    persist: bool,
    max_age: Option<Duration>,
}

impl<S, St, Cl> AnalyzeUseCase<S, St, Cl>
where
    S: ProfileSource + ?Sized,
    St: AnalysisStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(source: Arc<S>, store: Arc<St>, clock: Arc<Cl>, analyzer: Analyzer) -> Self {
        Self {
            source,
            store,
            clock,
            analyzer,
            persist: true,
            max_age: None,
        }
    }

    /// Still compare against stored history, but never write
    pub fn without_persistence(mut self) -> Self {
        self.persist = false;
        self
    }

    /// Serve a stored analysis younger than `max_age` instead of fetching again
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Analyze `username`, reusing a fresh stored analysis when one exists
    pub async fn analyze_username(&self, username: &str) -> Result<AnalysisReport, AnalyzeError> {
        let username = normalize_username(username)?;

        if let Some(report) = self.fresh_report(&username).await? {
            return Ok(report);
        }
        self.fetch_and_analyze(&username).await
    }

    /// Fetch and analyze `username` even if a fresh analysis is stored
    pub async fn refresh_username(&self, username: &str) -> Result<AnalysisReport, AnalyzeError> {
        let username = normalize_username(username)?;
        self.fetch_and_analyze(&username).await
    }

    async fn fetch_and_analyze(&self, username: &str) -> Result<AnalysisReport, AnalyzeError> {
        tracing::debug!(username = %username, source = self.source.name(), "Fetching snapshot");
        let snapshot = self.source.fetch_snapshot(username).await?;

        let fetched = normalize_username(&snapshot.username)?;
        if fetched != username {
            return Err(ProfileSourceError::InvalidPayload(format!(
                "requested @{} but the source returned @{}",
                username, fetched
            ))
            .into());
        }

        self.analyze_snapshot(&snapshot).await
    }

    async fn fresh_report(&self, username: &str) -> Result<Option<AnalysisReport>, AnalyzeError> {
        let Some(max_age) = self.max_age else {
            return Ok(None);
        };

        let mut records = self.store.history(username, 2).await?.into_iter();
        let Some(latest) = records.next() else {
            return Ok(None);
        };
        let age = self.clock.now() - latest.result.analyzed_at;
        if age >= max_age {
            return Ok(None);
        }

        tracing::info!(
            username = %username,
            age_secs = age.whole_seconds(),
            "Reusing stored analysis"
        );
        let prior = records.next();
        let comparison = compare(
            &latest.result,
            prior.as_ref().map(|record| &record.result),
            self.analyzer.config().trend_epsilon,
        );
        Ok(Some(AnalysisReport {
            result: latest.result,
            comparison,
            cached: true,
        }))
    }

    /// Analyze a caller-supplied snapshot
    pub async fn analyze_snapshot(
        &self,
        snapshot: &ProfileSnapshot,
    ) -> Result<AnalysisReport, AnalyzeError> {
        let username = normalize_username(&snapshot.username)?;
        let prior = self.store.latest(&username).await?;

        let report = self.analyzer.analyze(
            snapshot,
            prior.as_ref().map(|record| &record.result),
            self.clock.now(),
        )?;

        tracing::info!(
            username = %report.result.username,
            score = report.result.opportunity_score,
            potential = %report.result.growth_potential,
            issues = report.result.issues.len(),
            trend = ?report.comparison.as_ref().map(|c| c.trend),
            "Analyzed profile"
        );

        if self.persist {
            self.store.record(&report.result).await?;
        }

        Ok(report)
    }
}
