//! Threshold table for the analysis engine
//!
//! Every cutoff the metric calculator, issue detector, scorer and trend
//! comparator use lives here. Callers inject an [`AnalysisConfig`]; nothing in
//! the engine hardcodes a boundary.

use serde::{Deserialize, Serialize};

use crate::model::{IssueKind, PostingFrequency};

/// Default minimum |score delta| reported as a trend
pub const DEFAULT_TREND_EPSILON: f64 = 0.25;

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub cadence: CadenceThresholds,
    pub issues: IssueThresholds,
    pub scoring: ScoringWeights,
    /// Score deltas within +/- this value are reported as stable
    pub trend_epsilon: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cadence: CadenceThresholds::default(),
            issues: IssueThresholds::default(),
            scoring: ScoringWeights::default(),
            trend_epsilon: DEFAULT_TREND_EPSILON,
        }
    }
}

/// Upper bounds (inclusive, in days) on the median post gap for each cadence bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceThresholds {
    pub daily_max_gap_days: f64,
    pub frequent_max_gap_days: f64,
    pub weekly_max_gap_days: f64,
    /// Gaps above this are inactive
    pub irregular_max_gap_days: f64,
}

impl Default for CadenceThresholds {
    fn default() -> Self {
        Self {
            daily_max_gap_days: 1.5,
            frequent_max_gap_days: 4.0,
            weekly_max_gap_days: 9.0,
            irregular_max_gap_days: 30.0,
        }
    }
}

impl CadenceThresholds {
    /// Map a median gap (days) to its cadence bucket
    pub fn categorize(&self, median_gap_days: f64) -> PostingFrequency {
        if median_gap_days <= self.daily_max_gap_days {
            PostingFrequency::Daily
        } else if median_gap_days <= self.frequent_max_gap_days {
            PostingFrequency::Frequent
        } else if median_gap_days <= self.weekly_max_gap_days {
            PostingFrequency::Weekly
        } else if median_gap_days <= self.irregular_max_gap_days {
            PostingFrequency::Irregular
        } else {
            PostingFrequency::Inactive
        }
    }
}

/// Cutoffs for the issue rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueThresholds {
    /// Engagement rate (percent) below which engagement is low
    pub engagement_floor_pct: f64,
    /// Accounts smaller than this are never flagged for low engagement
    pub engagement_min_followers: u64,
    /// Days since the last post above which the account is inactive
    pub dormancy_days: u32,
    /// following / followers above which the ratio is imbalanced
    pub follower_ratio_ceiling: f64,
    /// comments / likes below which community engagement is low
    pub comment_to_like_floor: f64,
    /// Total post count below which the content library is limited
    pub min_total_posts: u64,
    /// Biographies shorter than this (characters, trimmed) are incomplete
    pub min_bio_chars: usize,
}

impl Default for IssueThresholds {
    fn default() -> Self {
        Self {
            engagement_floor_pct: 3.0,
            engagement_min_followers: 100,
            dormancy_days: 7,
            follower_ratio_ceiling: 1.0,
            comment_to_like_floor: 0.02,
            min_total_posts: 50,
            min_bio_chars: 1,
        }
    }
}

/// Points awarded once a count reaches `min`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountTier {
    pub min: u64,
    pub points: f64,
}

/// Points awarded while days-since-last-post is at most `max_days`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecencyTier {
    pub max_days: u32,
    pub points: f64,
}

/// Penalty subtracted from the baseline for each detected issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuePenalties {
    pub low_engagement: f64,
    pub irregular_posting: f64,
    pub inactive_account: f64,
    pub follow_ratio_imbalance: f64,
    pub low_community_engagement: f64,
    pub limited_content: f64,
    pub incomplete_bio: f64,
}

impl Default for IssuePenalties {
    fn default() -> Self {
        Self {
            low_engagement: 1.0,
            irregular_posting: 0.5,
            inactive_account: 0.75,
            follow_ratio_imbalance: 0.25,
            low_community_engagement: 0.5,
            limited_content: 0.5,
            incomplete_bio: 0.25,
        }
    }
}

impl IssuePenalties {
    pub fn for_issue(&self, kind: IssueKind) -> f64 {
        match kind {
            IssueKind::LowEngagement => self.low_engagement,
            IssueKind::IrregularPosting => self.irregular_posting,
            IssueKind::InactiveAccount => self.inactive_account,
            IssueKind::FollowRatioImbalance => self.follow_ratio_imbalance,
            IssueKind::LowCommunityEngagement => self.low_community_engagement,
            IssueKind::LimitedContent => self.limited_content,
            IssueKind::IncompleteBio => self.incomplete_bio,
        }
    }
}

/// Weights for the opportunity score and growth-potential buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub base_points: f64,
    pub follower_tiers: Vec<CountTier>,
    /// Tiers over the total post count
    pub content_tiers: Vec<CountTier>,
    pub activity_tiers: Vec<RecencyTier>,
    pub business_bonus: f64,
    pub penalties: IssuePenalties,
    /// Baseline at or above which an account counts as strong
    pub strong_baseline: f64,
    /// Baseline below which an account is too small to pursue
    pub weak_baseline: f64,
    /// Penalty at or above which a strong account has high growth potential
    pub high_penalty: f64,
    /// Total penalty at or below which the account counts as healthy
    pub negligible_penalty: f64,
    /// Accounts without a post in this many days (or with none at all) are dormant
    pub dormant_after_days: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base_points: 5.0,
            follower_tiers: vec![
                CountTier { min: 100, points: 1.0 },
                CountTier { min: 1_000, points: 2.5 },
                CountTier { min: 10_000, points: 3.0 },
                CountTier { min: 100_000, points: 3.5 },
            ],
            content_tiers: vec![
                CountTier { min: 12, points: 0.5 },
                CountTier { min: 50, points: 1.5 },
            ],
            activity_tiers: vec![
                RecencyTier { max_days: 30, points: 1.0 },
                RecencyTier { max_days: 90, points: 0.5 },
            ],
            business_bonus: 0.5,
            penalties: IssuePenalties::default(),
            strong_baseline: 9.0,
            weak_baseline: 7.0,
            high_penalty: 3.0,
            negligible_penalty: 0.25,
            dormant_after_days: 180,
        }
    }
}

impl ScoringWeights {
    /// Best tier reached by the follower count
    pub fn follower_points(&self, followers: u64) -> f64 {
        count_tier_points(&self.follower_tiers, followers)
    }

    /// Best tier reached by the total post count
    pub fn content_points(&self, total_posts: u64) -> f64 {
        count_tier_points(&self.content_tiers, total_posts)
    }

    /// Best recency tier satisfied; unknown recency earns nothing
    pub fn activity_points(&self, days_since_last_post: Option<u32>) -> f64 {
        let Some(days) = days_since_last_post else {
            return 0.0;
        };
        self.activity_tiers
            .iter()
            .filter(|tier| days <= tier.max_days)
            .map(|tier| tier.points)
            .fold(0.0, f64::max)
    }
}

// Max over every tier reached, so tier order in the table does not matter
fn count_tier_points(tiers: &[CountTier], value: u64) -> f64 {
    tiers
        .iter()
        .filter(|tier| value >= tier.min)
        .map(|tier| tier.points)
        .fold(0.0, f64::max)
}

/// Rejected engine configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Cadence boundaries must be positive and strictly increasing (daily < frequent < weekly < irregular)")]
    CadenceOrder,
    #[error("{name} must be a finite, non-negative number (got {value})")]
    Negative { name: String, value: f64 },
    #[error("weak_baseline ({weak}) must not exceed strong_baseline ({strong})")]
    BaselineOrder { weak: f64, strong: f64 },
}

impl AnalysisConfig {
    /// Reject settings that would break the scorer's monotonicity or the cadence table
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cadence = &self.cadence;
        let bounds = [
            cadence.daily_max_gap_days,
            cadence.frequent_max_gap_days,
            cadence.weekly_max_gap_days,
            cadence.irregular_max_gap_days,
        ];
        if bounds.iter().any(|b| !b.is_finite() || *b <= 0.0)
            || bounds.windows(2).any(|pair| pair[0] >= pair[1])
        {
            return Err(ConfigError::CadenceOrder);
        }

        let scoring = &self.scoring;
        let mut checks = vec![
            ("issues.engagement_floor_pct", self.issues.engagement_floor_pct),
            ("issues.follower_ratio_ceiling", self.issues.follower_ratio_ceiling),
            ("issues.comment_to_like_floor", self.issues.comment_to_like_floor),
            ("scoring.base_points", scoring.base_points),
            ("scoring.business_bonus", scoring.business_bonus),
            ("scoring.strong_baseline", scoring.strong_baseline),
            ("scoring.weak_baseline", scoring.weak_baseline),
            ("scoring.high_penalty", scoring.high_penalty),
            ("scoring.negligible_penalty", scoring.negligible_penalty),
            ("trend_epsilon", self.trend_epsilon),
        ];
        for kind in IssueKind::ALL {
            checks.push(("scoring.penalties", scoring.penalties.for_issue(kind)));
        }
        checks.extend(
            scoring
                .follower_tiers
                .iter()
                .map(|t| ("scoring.follower_tiers.points", t.points)),
        );
        checks.extend(
            scoring
                .content_tiers
                .iter()
                .map(|t| ("scoring.content_tiers.points", t.points)),
        );
        checks.extend(
            scoring
                .activity_tiers
                .iter()
                .map(|t| ("scoring.activity_tiers.points", t.points)),
        );

        if let Some((name, value)) = checks
            .into_iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(ConfigError::Negative {
                name: name.to_string(),
                value,
            });
        }

        if scoring.weak_baseline > scoring.strong_baseline {
            return Err(ConfigError::BaselineOrder {
                weak: scoring.weak_baseline,
                strong: scoring.strong_baseline,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_cadence_boundaries_are_inclusive() {
        let cadence = CadenceThresholds::default();
        assert_eq!(cadence.categorize(1.0), PostingFrequency::Daily);
        assert_eq!(cadence.categorize(1.5), PostingFrequency::Daily);
        assert_eq!(cadence.categorize(1.6), PostingFrequency::Frequent);
        assert_eq!(cadence.categorize(4.0), PostingFrequency::Frequent);
        assert_eq!(cadence.categorize(7.0), PostingFrequency::Weekly);
        assert_eq!(cadence.categorize(9.0), PostingFrequency::Weekly);
        assert_eq!(cadence.categorize(12.0), PostingFrequency::Irregular);
        assert_eq!(cadence.categorize(30.0), PostingFrequency::Irregular);
        assert_eq!(cadence.categorize(30.5), PostingFrequency::Inactive);
    }

    #[test]
    fn test_follower_points_take_highest_reached_tier() {
        let weights = ScoringWeights::default();
        assert_eq!(weights.follower_points(0), 0.0);
        assert_eq!(weights.follower_points(99), 0.0);
        assert_eq!(weights.follower_points(100), 1.0);
        assert_eq!(weights.follower_points(2_450), 2.5);
        assert_eq!(weights.follower_points(5_000_000), 3.5);
    }

    #[test]
    fn test_activity_points() {
        let weights = ScoringWeights::default();
        assert_eq!(weights.activity_points(None), 0.0);
        assert_eq!(weights.activity_points(Some(0)), 1.0);
        assert_eq!(weights.activity_points(Some(45)), 0.5);
        assert_eq!(weights.activity_points(Some(400)), 0.0);
    }

    #[test]
    fn test_validate_rejects_unordered_cadence() {
        let config = AnalysisConfig {
            cadence: CadenceThresholds {
                weekly_max_gap_days: 3.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::CadenceOrder));
    }

    #[test]
    fn test_validate_rejects_negative_penalty() {
        let mut config = AnalysisConfig::default();
        config.scoring.penalties.inactive_account = -0.5;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative { value, .. }) if value == -0.5
        ));
    }

    #[test]
    fn test_validate_rejects_swapped_baselines() {
        let mut config = AnalysisConfig::default();
        config.scoring.weak_baseline = 9.5;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::BaselineOrder { .. })
        ));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let json = r#"{ "issues": { "dormancy_days": 14 }, "trend_epsilon": 0.5 }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.issues.dormancy_days, 14);
        assert_eq!(config.issues.engagement_floor_pct, 3.0);
        assert_eq!(config.trend_epsilon, 0.5);
        assert_eq!(config.scoring, ScoringWeights::default());
    }
}
