//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{AnalysisRecord, AnalysisResult, ProfileSnapshot, StoreStats};

/// Error type for profile source operations
#[derive(Debug, Error)]
pub enum ProfileSourceError {
    #[error("Profile not found: {0}")]
    NotFound(String),
    #[error("Rate limited, retry after: {0:?}")]
    RateLimited(Option<std::time::Duration>),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("API error: {0}")]
    Api(String),
}

impl ProfileSourceError {
    /// Whether retrying later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Network(_))
    }
}

/// Port for fetching profile snapshots from a scraper
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the current snapshot for a username
    async fn fetch_snapshot(&self, username: &str) -> Result<ProfileSnapshot, ProfileSourceError>;

    /// Short name of the source (e.g., "fs", "http")
    fn name(&self) -> &'static str;
}

/// Error type for analysis store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting analyses and looking up prior results
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Persist a new analysis
    async fn record(&self, result: &AnalysisResult) -> Result<(), StoreError>;

    /// Most recent analysis for a username
    async fn latest(&self, username: &str) -> Result<Option<AnalysisRecord>, StoreError>;

    /// Analyses for a username, newest first
    async fn history(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError>;

    /// Latest analysis per subject with score >= `min_score`, best first
    async fn top_opportunities(
        &self,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError>;

    /// Flag the latest analysis of a subject as contacted. Returns false if the
    /// subject has never been analyzed.
    async fn mark_contacted(
        &self,
        username: &str,
        notes: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<bool, StoreError>;

    /// Flag the latest analysis of a subject as converted
    async fn mark_converted(
        &self,
        username: &str,
        notes: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<bool, StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
