//! Fake ports shared by the use case tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::datetime;

use crate::model::{
    AnalysisRecord, AnalysisResult, MediaType, OutreachStatus, PostSample, ProfileSnapshot,
    StoreStats,
};
use crate::ports::{AnalysisStore, Clock, ProfileSource, ProfileSourceError, StoreError};

pub const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

/// Snapshot matching the documented sample (score 7.5, medium)
pub fn sample_snapshot(username: &str, followers: i64) -> ProfileSnapshot {
    let post = |likes, comments, days| PostSample {
        likes,
        comments,
        posted_at: (NOW - time::Duration::days(days))
            .format(&Rfc3339)
            .unwrap(),
        media_type: MediaType::Image,
        caption: None,
    };
    ProfileSnapshot {
        username: username.to_string(),
        full_name: "Sample".to_string(),
        biography: "Local business".to_string(),
        followers,
        following: 3200,
        total_posts: 180,
        is_business: false,
        is_verified: false,
        recent_posts: vec![
            post(30, 8, 12),
            post(40, 10, 24),
            post(35, 9, 36),
            post(35, 9, 48),
        ],
        captured_at: NOW.format(&Rfc3339).unwrap(),
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub snapshots: HashMap<String, ProfileSnapshot>,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with(snapshots: Vec<ProfileSnapshot>) -> Self {
        Self {
            snapshots: snapshots
                .into_iter()
                .map(|s| (s.username.to_lowercase(), s))
                .collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileSource for FakeSource {
    async fn fetch_snapshot(&self, username: &str) -> Result<ProfileSnapshot, ProfileSourceError> {
        self.calls.lock().unwrap().push(username.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.snapshots
            .get(username)
            .cloned()
            .ok_or_else(|| ProfileSourceError::NotFound(username.to_string()))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub results: Mutex<Vec<AnalysisResult>>,
    pub fail_writes: bool,
}

#[async_trait]
impl AnalysisStore for FakeStore {
    async fn record(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Database("disk full".to_string()));
        }
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn latest(&self, username: &str) -> Result<Option<AnalysisRecord>, StoreError> {
        Ok(self
            .results
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.username == username)
            .map(|r| AnalysisRecord {
                result: r.clone(),
                outreach: OutreachStatus::default(),
            }))
    }

    async fn history(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        Ok(self
            .results
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|r| r.username == username)
            .take(limit)
            .map(|r| AnalysisRecord {
                result: r.clone(),
                outreach: OutreachStatus::default(),
            })
            .collect())
    }

    async fn top_opportunities(
        &self,
        _min_score: f64,
        _limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        Ok(vec![])
    }

    async fn mark_contacted(
        &self,
        _username: &str,
        _notes: Option<&str>,
        _at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn mark_converted(
        &self,
        _username: &str,
        _notes: Option<&str>,
        _at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(StoreStats::default())
    }
}

pub struct FakeClock {
    pub time: OffsetDateTime,
}

impl Clock for FakeClock {
    fn now(&self) -> OffsetDateTime {
        self.time
    }
}
