//! SQLite analysis store implementation

use async_trait::async_trait;
use profile_scout_domain::{
    AnalysisRecord, AnalysisResult, AnalysisStore, OutreachStatus, StoreError, StoreStats,
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const RECORD_COLUMNS: &str =
    "payload, contacted, contacted_at, converted, converted_at, notes";

/// Selects the rowid of the newest analysis for the bound username
const LATEST_ROWID: &str = "SELECT rowid FROM analysis_history WHERE username = ? \
     ORDER BY analyzed_ts DESC, rowid DESC LIMIT 1";

type RecordRow = (
    String,
    bool,
    Option<String>,
    bool,
    Option<String>,
    Option<String>,
);

/// SQLite-backed analysis store
pub struct SqliteAnalysisStore {
    pool: SqlitePool,
}

impl SqliteAnalysisStore {
    /// Create a new SQLite analysis store, initializing the database if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analysis_history (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                analyzed_ts INTEGER NOT NULL,
                analyzed_at TEXT NOT NULL,
                opportunity_score REAL NOT NULL,
                growth_potential TEXT NOT NULL,
                payload TEXT NOT NULL,
                contacted INTEGER NOT NULL DEFAULT 0,
                contacted_at TEXT,
                converted INTEGER NOT NULL DEFAULT 0,
                converted_at TEXT,
                notes TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_analysis_subject
            ON analysis_history(username, analyzed_ts)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

fn format_time(at: OffsetDateTime) -> Result<String, StoreError> {
    at.format(&Rfc3339)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_time(value: Option<String>) -> Result<Option<OffsetDateTime>, StoreError> {
    value
        .map(|s| {
            OffsetDateTime::parse(&s, &Rfc3339)
                .map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .transpose()
}

fn to_record(row: RecordRow) -> Result<AnalysisRecord, StoreError> {
    let (payload, contacted, contacted_at, converted, converted_at, notes) = row;
    let result: AnalysisResult =
        serde_json::from_str(&payload).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(AnalysisRecord {
        result,
        outreach: OutreachStatus {
            contacted,
            contacted_at: parse_time(contacted_at)?,
            converted,
            converted_at: parse_time(converted_at)?,
            notes,
        },
    })
}

fn to_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl AnalysisStore for SqliteAnalysisStore {
    async fn record(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        let payload =
            serde_json::to_string(result).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let analyzed_ts = i64::try_from(result.analyzed_at.unix_timestamp_nanos())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO analysis_history
                (id, username, analyzed_ts, analyzed_at, opportunity_score, growth_potential, payload)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(result.id.to_string())
        .bind(&result.username)
        .bind(analyzed_ts)
        .bind(format_time(result.analyzed_at)?)
        .bind(result.opportunity_score)
        .bind(result.growth_potential.as_str())
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn latest(&self, username: &str) -> Result<Option<AnalysisRecord>, StoreError> {
        let row: Option<RecordRow> = sqlx::query_as(&format!(
            "SELECT {RECORD_COLUMNS} FROM analysis_history WHERE username = ? \
             ORDER BY analyzed_ts DESC, rowid DESC LIMIT 1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(to_record).transpose()
    }

    async fn history(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            "SELECT {RECORD_COLUMNS} FROM analysis_history WHERE username = ? \
             ORDER BY analyzed_ts DESC, rowid DESC LIMIT ?"
        ))
        .bind(username)
        .bind(to_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(to_record).collect()
    }

    async fn top_opportunities(
        &self,
        min_score: f64,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            r#"
            SELECT {RECORD_COLUMNS} FROM analysis_history h
            WHERE h.rowid = (
                SELECT rowid FROM analysis_history
                WHERE username = h.username
                ORDER BY analyzed_ts DESC, rowid DESC LIMIT 1
            )
            AND h.opportunity_score >= ?
            ORDER BY h.opportunity_score DESC, h.username ASC
            LIMIT ?
            "#
        ))
        .bind(min_score)
        .bind(to_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(to_record).collect()
    }

    async fn mark_contacted(
        &self,
        username: &str,
        notes: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!(
            "UPDATE analysis_history \
             SET contacted = 1, contacted_at = ?, notes = COALESCE(?, notes) \
             WHERE rowid = ({LATEST_ROWID})"
        ))
        .bind(format_time(at)?)
        .bind(notes)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_converted(
        &self,
        username: &str,
        notes: Option<&str>,
        at: OffsetDateTime,
    ) -> Result<bool, StoreError> {
        let at = format_time(at)?;
        let result = sqlx::query(&format!(
            "UPDATE analysis_history \
             SET contacted = 1, contacted_at = COALESCE(contacted_at, ?), \
                 converted = 1, converted_at = ?, notes = COALESCE(?, notes) \
             WHERE rowid = ({LATEST_ROWID})"
        ))
        .bind(&at)
        .bind(&at)
        .bind(notes)
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let (profiles, analyses, contacted, converted): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(DISTINCT username),
                COUNT(*),
                COUNT(DISTINCT CASE WHEN contacted = 1 THEN username END),
                COUNT(DISTINCT CASE WHEN converted = 1 THEN username END)
            FROM analysis_history
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        let count = |n: i64| u64::try_from(n).unwrap_or_default();
        Ok(StoreStats {
            profiles: count(profiles),
            analyses: count(analyses),
            contacted: count(contacted),
            converted: count(converted),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NOW, analysis};
    use tempfile::TempDir;
    use time::Duration;

    #[tokio::test]
    async fn test_record_and_latest_round_trip() {
        let store = SqliteAnalysisStore::in_memory().await.unwrap();
        let result = analysis("cafe_roma", 7.5, NOW);

        store.record(&result).await.unwrap();

        let latest = store.latest("cafe_roma").await.unwrap().unwrap();
        assert_eq!(latest.result.id, result.id);
        assert_eq!(latest.result.analyzed_at, result.analyzed_at);
        assert_eq!(latest.result.issues, result.issues);
        assert_eq!(latest.result.recommendations, result.recommendations);
        assert_eq!(latest.outreach, OutreachStatus::default());
        assert!(store.latest("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_history_newest_first_with_limit() {
        let store = SqliteAnalysisStore::in_memory().await.unwrap();
        for (days_ago, score) in [(14, 6.0), (0, 7.5), (7, 6.5)] {
            store
                .record(&analysis("cafe_roma", score, NOW - Duration::days(days_ago)))
                .await
                .unwrap();
        }

        let history = store.history("cafe_roma", 2).await.unwrap();
        let scores: Vec<f64> = history.iter().map(|r| r.result.opportunity_score).collect();
        assert_eq!(scores, vec![7.5, 6.5]);

        let latest = store.latest("cafe_roma").await.unwrap().unwrap();
        assert_eq!(latest.result.opportunity_score, 7.5);
    }

    #[tokio::test]
    async fn test_top_opportunities_uses_latest_per_subject() {
        let store = SqliteAnalysisStore::in_memory().await.unwrap();
        store
            .record(&analysis("alpha", 9.0, NOW - Duration::days(3)))
            .await
            .unwrap();
        store.record(&analysis("alpha", 4.0, NOW)).await.unwrap();
        store.record(&analysis("beta", 6.0, NOW)).await.unwrap();
        store.record(&analysis("gamma", 8.0, NOW)).await.unwrap();
        store.record(&analysis("delta", 6.0, NOW)).await.unwrap();

        let top = store.top_opportunities(5.0, 10).await.unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.result.username.as_str()).collect();
        assert_eq!(names, vec!["gamma", "beta", "delta"]);

        let limited = store.top_opportunities(5.0, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].result.username, "gamma");
    }

    #[tokio::test]
    async fn test_outreach_applies_to_latest_only() {
        let store = SqliteAnalysisStore::in_memory().await.unwrap();
        store
            .record(&analysis("alpha", 6.0, NOW - Duration::days(7)))
            .await
            .unwrap();
        store.record(&analysis("alpha", 7.0, NOW)).await.unwrap();

        assert!(
            store
                .mark_contacted("alpha", Some("sent intro email"), NOW)
                .await
                .unwrap()
        );
        assert!(!store.mark_contacted("nobody", None, NOW).await.unwrap());

        let history = store.history("alpha", 10).await.unwrap();
        assert!(history[0].outreach.contacted);
        assert_eq!(history[0].outreach.contacted_at, Some(NOW));
        assert_eq!(
            history[0].outreach.notes.as_deref(),
            Some("sent intro email")
        );
        assert!(!history[1].outreach.contacted);

        let later = NOW + Duration::days(2);
        assert!(store.mark_converted("alpha", None, later).await.unwrap());
        let latest = store.latest("alpha").await.unwrap().unwrap();
        assert!(latest.outreach.converted);
        assert_eq!(latest.outreach.contacted_at, Some(NOW));
        assert_eq!(latest.outreach.converted_at, Some(later));
        assert_eq!(latest.outreach.notes.as_deref(), Some("sent intro email"));
    }

    #[tokio::test]
    async fn test_stats_counts_distinct_subjects() {
        let store = SqliteAnalysisStore::in_memory().await.unwrap();
        store
            .record(&analysis("alpha", 6.0, NOW - Duration::days(7)))
            .await
            .unwrap();
        store.record(&analysis("alpha", 7.0, NOW)).await.unwrap();
        store.record(&analysis("beta", 5.0, NOW)).await.unwrap();
        store.mark_converted("beta", None, NOW).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(
            stats,
            StoreStats {
                profiles: 2,
                analyses: 3,
                contacted: 1,
                converted: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("scout.db");

        {
            let store = SqliteAnalysisStore::new(&path).await.unwrap();
            store.record(&analysis("alpha", 7.0, NOW)).await.unwrap();
        }

        let reopened = SqliteAnalysisStore::new(&path).await.unwrap();
        let latest = reopened.latest("alpha").await.unwrap().unwrap();
        assert_eq!(latest.result.opportunity_score, 7.0);
    }
}
