//! Filesystem profile source: one `<username>.json` snapshot per profile

use async_trait::async_trait;
use profile_scout_domain::{
    ProfileSnapshot, ProfileSource, ProfileSourceError, normalize_username,
};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Reads snapshots exported by the scraper from a directory
pub struct FsProfileSource {
    dir: PathBuf,
}

impl FsProfileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn snapshot_path(&self, username: &str) -> PathBuf {
        self.dir.join(format!("{}.json", username))
    }
}

#[async_trait]
impl ProfileSource for FsProfileSource {
    async fn fetch_snapshot(&self, username: &str) -> Result<ProfileSnapshot, ProfileSourceError> {
        let path = self.snapshot_path(username);
        tracing::debug!(path = %path.display(), "Reading snapshot");

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ProfileSourceError::NotFound(username.to_string())
            } else {
                ProfileSourceError::Api(format!("Failed to read {}: {}", path.display(), e))
            }
        })?;

        let snapshot: ProfileSnapshot = serde_json::from_str(&content).map_err(|e| {
            ProfileSourceError::InvalidPayload(format!("{}: {}", path.display(), e))
        })?;

        // A file named after one handle must not describe another
        if normalize_username(&snapshot.username).ok().as_deref() != Some(username) {
            return Err(ProfileSourceError::InvalidPayload(format!(
                "{}: snapshot is for '{}'",
                path.display(),
                snapshot.username
            )));
        }

        Ok(snapshot)
    }

    fn name(&self) -> &'static str {
        "fs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) {
        std::fs::write(dir.path().join(name), body).unwrap();
    }

    #[tokio::test]
    async fn test_reads_snapshot_file() {
        let dir = TempDir::new().unwrap();
        let body = json!({
            "username": "Cafe_Roma",
            "followers": 2450,
            "following": 3200,
            "total_posts": 180,
            "recent_posts": [
                {"likes": 30, "comments": 8, "posted_at": "2024-05-20T12:00:00Z"}
            ],
            "captured_at": "2024-06-01T12:00:00Z"
        });
        write(&dir, "cafe_roma.json", &body.to_string());

        let source = FsProfileSource::new(dir.path());
        let snapshot = source.fetch_snapshot("cafe_roma").await.unwrap();

        assert_eq!(snapshot.followers, 2450);
        assert_eq!(snapshot.recent_posts.len(), 1);
        assert_eq!(source.name(), "fs");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let source = FsProfileSource::new(dir.path());

        let err = source.fetch_snapshot("nobody").await.unwrap_err();
        assert!(matches!(err, ProfileSourceError::NotFound(ref u) if u == "nobody"));
    }

    #[tokio::test]
    async fn test_malformed_file_is_invalid_payload() {
        let dir = TempDir::new().unwrap();
        write(&dir, "broken.json", "{ not json");

        let source = FsProfileSource::new(dir.path());
        let err = source.fetch_snapshot("broken").await.unwrap_err();
        assert!(matches!(err, ProfileSourceError::InvalidPayload(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_mismatched_username_is_rejected() {
        let dir = TempDir::new().unwrap();
        let body = json!({
            "username": "someone_else",
            "followers": 1,
            "following": 1,
            "total_posts": 0,
            "captured_at": "2024-06-01T12:00:00Z"
        });
        write(&dir, "cafe_roma.json", &body.to_string());

        let source = FsProfileSource::new(dir.path());
        let err = source.fetch_snapshot("cafe_roma").await.unwrap_err();
        assert!(matches!(err, ProfileSourceError::InvalidPayload(_)));
    }
}
