//! Profile snapshot sources

mod fs;
mod http;

pub use fs::FsProfileSource;
pub use http::HttpProfileSource;

use async_trait::async_trait;
use profile_scout_domain::{
    MediaType, PostSample, ProfileSnapshot, ProfileSource, ProfileSourceError,
    normalize_username,
};
use std::collections::HashMap;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// Stub profile source serving fixed snapshots
pub struct StubProfileSource {
    snapshots: HashMap<String, ProfileSnapshot>,
}

impl StubProfileSource {
    /// Create an empty stub
    pub fn new() -> Self {
        Self {
            snapshots: HashMap::new(),
        }
    }

    /// Create a stub with predefined snapshots, keyed by normalized username
    pub fn with_snapshots(snapshots: Vec<ProfileSnapshot>) -> Self {
        let snapshots = snapshots
            .into_iter()
            .map(|snapshot| {
                let key = normalize_username(&snapshot.username)
                    .unwrap_or_else(|_| snapshot.username.to_lowercase());
                (key, snapshot)
            })
            .collect();
        Self { snapshots }
    }

    /// Demo accounts covering the main outcomes, captured at `now`
    pub fn demo(now: OffsetDateTime) -> Self {
        Self::with_snapshots(vec![
            demo_snapshot(
                now,
                DemoProfile {
                    username: "demo_bakery",
                    full_name: "Corner Bakery",
                    biography: "Fresh bread every morning",
                    followers: 2450,
                    following: 3200,
                    total_posts: 180,
                    is_business: false,
                    posts: &[(30, 8, 12), (40, 10, 24), (35, 9, 36), (35, 9, 48)],
                },
            ),
            demo_snapshot(
                now,
                DemoProfile {
                    username: "demo_studio",
                    full_name: "Northside Yoga Studio",
                    biography: "",
                    followers: 48_000,
                    following: 52_000,
                    total_posts: 900,
                    is_business: true,
                    posts: &[(420, 6, 10), (380, 4, 25), (510, 9, 41), (300, 2, 60)],
                },
            ),
            demo_snapshot(
                now,
                DemoProfile {
                    username: "demo_coffee",
                    full_name: "Daily Grind Coffee",
                    biography: "Roasting since 2012. Two locations downtown.",
                    followers: 5200,
                    following: 410,
                    total_posts: 640,
                    is_business: true,
                    posts: &[
                        (260, 22, 0),
                        (240, 18, 1),
                        (300, 25, 2),
                        (280, 20, 3),
                        (250, 19, 4),
                    ],
                },
            ),
            demo_snapshot(
                now,
                DemoProfile {
                    username: "demo_dormant",
                    full_name: "Old Florist",
                    biography: "Closed for renovation",
                    followers: 800,
                    following: 150,
                    total_posts: 35,
                    is_business: false,
                    posts: &[(12, 1, 210), (15, 0, 240)],
                },
            ),
        ])
    }

    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.snapshots.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for StubProfileSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileSource for StubProfileSource {
    async fn fetch_snapshot(&self, username: &str) -> Result<ProfileSnapshot, ProfileSourceError> {
        self.snapshots
            .get(username)
            .cloned()
            .ok_or_else(|| ProfileSourceError::NotFound(username.to_string()))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

struct DemoProfile {
    username: &'static str,
    full_name: &'static str,
    biography: &'static str,
    followers: i64,
    following: i64,
    total_posts: i64,
    is_business: bool,
    /// (likes, comments, days ago)
    posts: &'static [(i64, i64, i64)],
}

fn demo_snapshot(now: OffsetDateTime, profile: DemoProfile) -> ProfileSnapshot {
    let stamp = |at: OffsetDateTime| at.format(&Rfc3339).unwrap_or_default();
    ProfileSnapshot {
        username: profile.username.to_string(),
        full_name: profile.full_name.to_string(),
        biography: profile.biography.to_string(),
        followers: profile.followers,
        following: profile.following,
        total_posts: profile.total_posts,
        is_business: profile.is_business,
        is_verified: false,
        recent_posts: profile
            .posts
            .iter()
            .enumerate()
            .map(|(i, &(likes, comments, days_ago))| PostSample {
                likes,
                comments,
                posted_at: stamp(now - Duration::days(days_ago)),
                media_type: if i % 3 == 1 {
                    MediaType::Video
                } else {
                    MediaType::Image
                },
                caption: None,
            })
            .collect(),
        captured_at: stamp(now),
    }
}
