//! Opportunity digest - recent, not yet contacted leads from the store

use std::sync::Arc;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::{
    model::AnalysisRecord,
    ports::{AnalysisStore, Clock, StoreError},
};

#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Only analyses newer than this count
    pub window: Duration,
    pub min_score: f64,
    pub limit: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            window: Duration::days(7),
            min_score: 6.0,
            limit: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Digest {
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub since: OffsetDateTime,
    pub min_score: f64,
    pub entries: Vec<AnalysisRecord>,
}

pub struct OpportunityDigest<St, Cl>
where
    St: AnalysisStore + ?Sized,
    Cl: Clock + ?Sized,
{
    store: Arc<St>,
    clock: Arc<Cl>,
    config: DigestConfig,
}

impl<St, Cl> OpportunityDigest<St, Cl>
where
    St: AnalysisStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(store: Arc<St>, clock: Arc<Cl>, config: DigestConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Best uncontacted subjects whose latest analysis falls inside the window
    pub async fn build(&self) -> Result<Digest, StoreError> {
        let generated_at = self.clock.now();
        let since = generated_at - self.config.window;

        let mut entries: Vec<AnalysisRecord> = self
            .store
            .top_opportunities(self.config.min_score, usize::MAX)
            .await?
            .into_iter()
            .filter(|record| record.result.analyzed_at >= since && !record.outreach.contacted)
            .collect();
        entries.truncate(self.config.limit);

        tracing::info!(
            entries = entries.len(),
            min_score = self.config.min_score,
            window_days = self.config.window.whole_days(),
            "Built opportunity digest"
        );

        Ok(Digest {
            generated_at,
            since,
            min_score: self.config.min_score,
            entries,
        })
    }
}
