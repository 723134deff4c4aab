//! Domain models and value objects

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._]{1,30}$").expect("Valid regex"));

/// A point-in-time capture of a public profile, as supplied by the scraper.
///
/// Counts are signed and timestamps are raw RFC 3339 strings so that bad
/// upstream data stays representable and can be rejected by [`ProfileSnapshot::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Profile handle (without @)
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub biography: String,
    pub followers: i64,
    pub following: i64,
    /// Total posts ever published (not just the sample)
    pub total_posts: i64,
    #[serde(default)]
    pub is_business: bool,
    #[serde(default)]
    pub is_verified: bool,
    /// Most recent posts, in any order
    #[serde(default)]
    pub recent_posts: Vec<PostSample>,
    /// When the snapshot was taken (RFC 3339)
    pub captured_at: String,
}

/// Engagement statistics for a single post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSample {
    pub likes: i64,
    pub comments: i64,
    /// Publication time (RFC 3339)
    pub posted_at: String,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Image,
    Video,
    Carousel,
}

/// Snapshot rejected before analysis
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Invalid username '{0}': must be 1-30 characters of [A-Za-z0-9._]")]
    InvalidUsername(String),
    #[error("Negative count in {field}: {value}")]
    NegativeCount { field: String, value: i64 },
    #[error("Unparseable timestamp in {field}: '{value}'")]
    InvalidTimestamp { field: String, value: String },
}

/// Normalize a handle to its canonical lowercase form, stripping a leading `@`
pub fn normalize_username(raw: &str) -> Result<String, SnapshotError> {
    let trimmed = raw.trim();
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if !USERNAME_PATTERN.is_match(handle) {
        return Err(SnapshotError::InvalidUsername(raw.to_string()));
    }
    Ok(handle.to_ascii_lowercase())
}

impl ProfileSnapshot {
    /// Check counts, timestamps and username, producing the typed form the engine consumes
    pub fn validate(&self) -> Result<ValidatedSnapshot, SnapshotError> {
        let username = normalize_username(&self.username)?;

        let posts = self
            .recent_posts
            .iter()
            .enumerate()
            .map(|(index, post)| {
                Ok(ValidatedPost {
                    likes: non_negative(&format!("recent_posts[{index}].likes"), post.likes)?,
                    comments: non_negative(
                        &format!("recent_posts[{index}].comments"),
                        post.comments,
                    )?,
                    posted_at: parse_timestamp(
                        &format!("recent_posts[{index}].posted_at"),
                        &post.posted_at,
                    )?,
                    media_type: post.media_type,
                })
            })
            .collect::<Result<Vec<_>, SnapshotError>>()?;

        Ok(ValidatedSnapshot {
            username,
            full_name: self.full_name.clone(),
            biography: self.biography.clone(),
            followers: non_negative("followers", self.followers)?,
            following: non_negative("following", self.following)?,
            total_posts: non_negative("total_posts", self.total_posts)?,
            is_business: self.is_business,
            is_verified: self.is_verified,
            posts,
            captured_at: parse_timestamp("captured_at", &self.captured_at)?,
        })
    }
}

fn non_negative(field: &str, value: i64) -> Result<u64, SnapshotError> {
    u64::try_from(value).map_err(|_| SnapshotError::NegativeCount {
        field: field.to_string(),
        value,
    })
}

fn parse_timestamp(field: &str, value: &str) -> Result<OffsetDateTime, SnapshotError> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).map_err(|_| SnapshotError::InvalidTimestamp {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// A snapshot that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSnapshot {
    /// Lowercase canonical handle
    pub username: String,
    pub full_name: String,
    pub biography: String,
    pub followers: u64,
    pub following: u64,
    pub total_posts: u64,
    pub is_business: bool,
    pub is_verified: bool,
    pub posts: Vec<ValidatedPost>,
    pub captured_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedPost {
    pub likes: u64,
    pub comments: u64,
    pub posted_at: OffsetDateTime,
    pub media_type: MediaType,
}

/// Posting cadence bucket, derived from the median gap between posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingFrequency {
    Daily,
    /// Two to three posts per week
    Frequent,
    Weekly,
    Irregular,
    Inactive,
}

impl PostingFrequency {
    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Frequent => "2-3 times/week",
            Self::Weekly => "weekly",
            Self::Irregular => "irregular",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for PostingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metrics derived from a snapshot. Pure function of the snapshot and the reference time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// (avg likes + avg comments) / max(followers, 1) * 100, one decimal
    pub engagement_rate: f64,
    pub average_likes: f64,
    pub average_comments: f64,
    pub posting_frequency: PostingFrequency,
    /// Median gap between consecutive sampled posts; absent with fewer than two posts
    pub median_post_gap_days: Option<f64>,
    /// Whole days since the newest sampled post; `None` means unknown (no posts)
    pub days_since_last_post: Option<u32>,
    /// following / max(followers, 1)
    pub follower_ratio: f64,
    /// total comments / max(total likes, 1)
    pub comment_to_like_ratio: f64,
    /// Fraction of sampled posts that are video
    pub video_share: f64,
    /// Number of posts the metrics were computed from
    pub sample_size: usize,
}

/// Rule-detected deficiency tags, declared in rendering priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    LowEngagement,
    IrregularPosting,
    InactiveAccount,
    FollowRatioImbalance,
    LowCommunityEngagement,
    LimitedContent,
    IncompleteBio,
}

impl IssueKind {
    /// Every tag, in priority order
    pub const ALL: [IssueKind; 7] = [
        Self::LowEngagement,
        Self::IrregularPosting,
        Self::InactiveAccount,
        Self::FollowRatioImbalance,
        Self::LowCommunityEngagement,
        Self::LimitedContent,
        Self::IncompleteBio,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowEngagement => "low-engagement",
            Self::IrregularPosting => "irregular-posting",
            Self::InactiveAccount => "inactive-account",
            Self::FollowRatioImbalance => "follow-ratio-imbalance",
            Self::LowCommunityEngagement => "low-community-engagement",
            Self::LimitedContent => "limited-content",
            Self::IncompleteBio => "incomplete-bio",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected issue with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPotential {
    High,
    Medium,
    Low,
}

impl GrowthPotential {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for GrowthPotential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a growth potential was assigned.
///
/// `Healthy`, `TooSmall` and `Dormant` all surface as [`GrowthPotential::Low`]
/// but for opposite reasons: the first has nothing left to fix, the other two
/// are not worth the effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotentialReason {
    /// Strong baseline with a heavy issue load
    RoomToImprove,
    Moderate,
    /// No issues detected
    Healthy,
    /// Baseline too weak to justify the work
    TooSmall,
    /// No known activity within the dormant cutoff
    Dormant,
}

impl PotentialReason {
    pub fn potential(self) -> GrowthPotential {
        match self {
            Self::RoomToImprove => GrowthPotential::High,
            Self::Moderate => GrowthPotential::Medium,
            Self::Healthy | Self::TooSmall | Self::Dormant => GrowthPotential::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoomToImprove => "room_to_improve",
            Self::Moderate => "moderate",
            Self::Healthy => "healthy",
            Self::TooSmall => "too_small",
            Self::Dormant => "dormant",
        }
    }
}

/// The two sides of the opportunity score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Value of the account if its issues were fixed
    pub baseline: f64,
    /// Sum of per-issue penalties
    pub penalty: f64,
}

/// Output of the opportunity scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpportunityAssessment {
    /// 1.0-10.0, one decimal
    pub score: f64,
    pub potential: GrowthPotential,
    pub reason: PotentialReason,
    pub breakdown: ScoreBreakdown,
}

/// Complete result of analyzing one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub followers: u64,
    pub following: u64,
    pub total_posts: u64,
    pub is_business: bool,
    pub metrics: Metrics,
    /// Issues in priority order
    pub issues: Vec<Issue>,
    /// Never empty
    pub recommendations: Vec<String>,
    pub opportunity_score: f64,
    pub growth_potential: GrowthPotential,
    pub potential_reason: PotentialReason,
    pub score_breakdown: ScoreBreakdown,
    #[serde(with = "time::serde::rfc3339")]
    pub analyzed_at: OffsetDateTime,
}

impl AnalysisResult {
    pub fn issue_kinds(&self) -> Vec<IssueKind> {
        self.issues.iter().map(|issue| issue.kind).collect()
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }
}

/// Direction of change between two analyses of the same subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deltas between the current analysis and the previous one for the same subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryComparison {
    pub follower_delta: i64,
    pub engagement_rate_delta: f64,
    pub score_delta: f64,
    pub trend: Trend,
    /// Issues present now but not in the prior analysis
    pub new_issues: Vec<IssueKind>,
    /// Issues present in the prior analysis but not now
    pub resolved_issues: Vec<IssueKind>,
    #[serde(with = "time::serde::rfc3339")]
    pub previous_analyzed_at: OffsetDateTime,
}

/// What the use cases hand back: the result plus its trend, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<HistoryComparison>,
    /// Served from the store instead of a fresh fetch
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

/// Sales follow-up state attached to a stored analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutreachStatus {
    pub contacted: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub contacted_at: Option<OffsetDateTime>,
    pub converted: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub converted_at: Option<OffsetDateTime>,
    pub notes: Option<String>,
}

/// A persisted analysis with its outreach status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub result: AnalysisResult,
    pub outreach: OutreachStatus,
}

/// Aggregate counts reported by a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Distinct subjects analyzed
    pub profiles: u64,
    pub analyses: u64,
    pub contacted: u64,
    pub converted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ProfileSnapshot {
        ProfileSnapshot {
            username: "Cafe.Roma".to_string(),
            full_name: "Cafe Roma".to_string(),
            biography: "Espresso bar".to_string(),
            followers: 1200,
            following: 300,
            total_posts: 80,
            is_business: true,
            is_verified: false,
            recent_posts: vec![PostSample {
                likes: 40,
                comments: 3,
                posted_at: "2024-05-30T10:00:00Z".to_string(),
                media_type: MediaType::Video,
                caption: None,
            }],
            captured_at: "2024-06-01T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_validate_normalizes_username() {
        let validated = snapshot().validate().unwrap();
        assert_eq!(validated.username, "cafe.roma");
        assert_eq!(validated.followers, 1200);
        assert_eq!(validated.posts.len(), 1);
        assert_eq!(validated.posts[0].media_type, MediaType::Video);
    }

    #[test]
    fn test_validate_rejects_negative_followers() {
        let mut snap = snapshot();
        snap.followers = -1;

        let err = snap.validate().unwrap_err();
        assert_eq!(
            err,
            SnapshotError::NegativeCount {
                field: "followers".to_string(),
                value: -1,
            }
        );
    }

    #[test]
    fn test_validate_rejects_negative_post_counts() {
        let mut snap = snapshot();
        snap.recent_posts[0].comments = -4;

        let err = snap.validate().unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::NegativeCount { ref field, value: -4 } if field == "recent_posts[0].comments"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_timestamp() {
        let mut snap = snapshot();
        snap.recent_posts[0].posted_at = "yesterday".to_string();

        let err = snap.validate().unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_capture_time() {
        let mut snap = snapshot();
        snap.captured_at = "2024-13-45".to_string();

        assert!(matches!(
            snap.validate(),
            Err(SnapshotError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("@Some_User").unwrap(), "some_user");
        assert!(normalize_username("").is_err());
        assert!(normalize_username("has space").is_err());
        assert!(normalize_username(&"a".repeat(31)).is_err());
    }

    #[test]
    fn test_issue_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&IssueKind::FollowRatioImbalance).unwrap();
        assert_eq!(json, "\"follow-ratio-imbalance\"");
        assert_eq!(IssueKind::FollowRatioImbalance.as_str(), "follow-ratio-imbalance");
    }

    #[test]
    fn test_low_reasons_share_external_category() {
        assert_eq!(PotentialReason::Healthy.potential(), GrowthPotential::Low);
        assert_eq!(PotentialReason::TooSmall.potential(), GrowthPotential::Low);
        assert_eq!(PotentialReason::Dormant.potential(), GrowthPotential::Low);
        assert_ne!(PotentialReason::Healthy, PotentialReason::TooSmall);
    }

    #[test]
    fn test_snapshot_deserializes_with_defaults() {
        let json = r#"{
            "username": "minimal",
            "followers": 10,
            "following": 5,
            "total_posts": 0,
            "captured_at": "2024-06-01T12:00:00Z"
        }"#;
        let snap: ProfileSnapshot = serde_json::from_str(json).unwrap();
        assert!(snap.recent_posts.is_empty());
        assert!(!snap.is_business);
        assert!(snap.validate().is_ok());
    }
}
