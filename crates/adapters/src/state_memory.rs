//! In-memory analysis store for testing and offline mode

use async_trait::async_trait;
use profile_scout_domain::{
    AnalysisRecord, AnalysisResult, AnalysisStore, OutreachStatus, StoreError, StoreStats,
};
use std::collections::HashMap;
use std::sync::RwLock;
use time::OffsetDateTime;

/// In-memory analysis store implementation
pub struct InMemoryAnalysisStore {
    /// Per-subject records, oldest first
    records: RwLock<HashMap<String, Vec<AnalysisRecord>>>,
}

impl InMemoryAnalysisStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    fn update_latest(
        &self,
        username: &str,
        apply: impl FnOnce(&mut OutreachStatus),
    ) -> Result<bool, StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        match records.get_mut(username).and_then(|list| list.last_mut()) {
            Some(latest) => {
                apply(&mut latest.outreach);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Default for InMemoryAnalysisStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryAnalysisStore {
    async fn record(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let list = records.entry(result.username.clone()).or_default();
        // Keep chronological order even if results arrive out of order
        let at = list.partition_point(|r| r.result.analyzed_at <= result.analyzed_at);
        list.insert(
            at,
            AnalysisRecord {
                result: result.clone(),
                outreach: OutreachStatus::default(),
            },
        );
        Ok(())
    }

    async fn latest(&self, username: &str) -> Result<Option<AnalysisRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(records.get(username).and_then(|list| list.last()).cloned())
    }

    async fn history(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(records
            .get(username)
            .map(|list| list.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn top_opportunities(
        &self,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let mut latest: Vec<AnalysisRecord> = records
            .values()
            .filter_map(|list| list.last())
            .filter(|record| record.result.opportunity_score >= min_score)
            .cloned()
            .collect();
        latest.sort_by(|a, b| {
            b.result
                .opportunity_score
                .total_cmp(&a.result.opportunity_score)
                .then_with(|| a.result.username.cmp(&b.result.username))
        });
        latest.truncate(limit);
        Ok(latest)
    }

    async fn mark_contacted(
        &self,
        username: &str,
        notes: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        self.update_latest(username, |outreach| {
            outreach.contacted = true;
            outreach.contacted_at = Some(at);
            if let Some(notes) = notes {
                outreach.notes = Some(notes.to_string());
            }
        })
    }

    async fn mark_converted(
        &self,
        username: &str,
        notes: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        self.update_latest(username, |outreach| {
            outreach.contacted = true;
            outreach.contacted_at.get_or_insert(at);
            outreach.converted = true;
            outreach.converted_at = Some(at);
            if let Some(notes) = notes {
                outreach.notes = Some(notes.to_string());
            }
        })
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let subjects_where = |pred: fn(&OutreachStatus) -> bool| {
            records
                .values()
                .filter(|list| list.iter().any(|r| pred(&r.outreach)))
                .count() as u64
        };
        Ok(StoreStats {
            profiles: records.len() as u64,
            analyses: records.values().map(|list| list.len() as u64).sum(),
            contacted: subjects_where(|o| o.contacted),
            converted: subjects_where(|o| o.converted),
        })
    }
}
