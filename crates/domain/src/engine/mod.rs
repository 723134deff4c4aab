//! Analysis and scoring engine
//!
//! Pure, synchronous components over in-memory values:
//! snapshot -> metrics -> issues -> score -> recommendations -> trend.
//! The only time input is the `now` reference passed by the caller.

pub mod issues;
pub mod metrics;
pub mod recommend;
pub mod scoring;
pub mod trend;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{AnalysisReport, AnalysisResult, ProfileSnapshot, SnapshotError};
use crate::thresholds::AnalysisConfig;

pub use issues::detect_issues;
pub use metrics::{compute_metrics, metrics_from_validated};
pub use recommend::recommend;
pub use scoring::{AccountSubstance, score};
pub use trend::compare;

/// Runs the full pipeline with one injected configuration
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one snapshot, comparing against `prior` when given.
    ///
    /// Fails only when the snapshot does not validate.
    pub fn analyze(
        &self,
        snapshot: &ProfileSnapshot,
        prior: Option<&AnalysisResult>,
        now: OffsetDateTime,
    ) -> Result<AnalysisReport, SnapshotError> {
        let validated = snapshot.validate()?;

        let metrics = metrics_from_validated(&validated, &self.config.cadence, now);
        let issues = detect_issues(&metrics, &validated, &self.config.issues);
        let assessment = score(
            &metrics,
            &AccountSubstance::from(&validated),
            &issues,
            &self.config.scoring,
        );
        let recommendations = recommend(&issues, &metrics);

        let result = AnalysisResult {
            id: Uuid::new_v4(),
            username: validated.username,
            full_name: validated.full_name,
            followers: validated.followers,
            following: validated.following,
            total_posts: validated.total_posts,
            is_business: validated.is_business,
            metrics,
            issues,
            recommendations,
            opportunity_score: assessment.score,
            growth_potential: assessment.potential,
            potential_reason: assessment.reason,
            score_breakdown: assessment.breakdown,
            analyzed_at: now,
        };
        let comparison = compare(&result, prior, self.config.trend_epsilon);

        Ok(AnalysisReport {
            result,
            comparison,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        GrowthPotential, IssueKind, MediaType, PostSample, PostingFrequency, PotentialReason,
        Trend,
    };
    use time::Duration;
    use time::format_description::well_known::Rfc3339;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    fn post(likes: i64, comments: i64, days_ago: i64, media_type: MediaType) -> PostSample {
        PostSample {
            likes,
            comments,
            posted_at: (NOW - Duration::days(days_ago)).format(&Rfc3339).unwrap(),
            media_type,
            caption: None,
        }
    }

    fn documented_sample() -> ProfileSnapshot {
        ProfileSnapshot {
            username: "@Sample_Boutique".to_string(),
            full_name: "Sample Boutique".to_string(),
            biography: "Curated fashion pieces".to_string(),
            followers: 2450,
            following: 3200,
            total_posts: 180,
            is_business: false,
            is_verified: false,
            recent_posts: vec![
                post(30, 8, 12, MediaType::Image),
                post(40, 10, 24, MediaType::Carousel),
                post(35, 9, 36, MediaType::Video),
                post(35, 9, 48, MediaType::Image),
            ],
            captured_at: NOW.format(&Rfc3339).unwrap(),
        }
    }

    fn healthy() -> ProfileSnapshot {
        // 80 interactions per post on 1000 followers, posting daily
        let posts = (1..=10)
            .map(|day| post(75, 5, day, MediaType::Video))
            .collect();
        ProfileSnapshot {
            username: "thriving_studio".to_string(),
            full_name: "Thriving Studio".to_string(),
            biography: "Design studio - commissions open".to_string(),
            followers: 1000,
            following: 100,
            total_posts: 420,
            is_business: true,
            is_verified: true,
            recent_posts: posts,
            captured_at: NOW.format(&Rfc3339).unwrap(),
        }
    }

    #[test]
    fn test_documented_sample_end_to_end() {
        let report = Analyzer::default()
            .analyze(&documented_sample(), None, NOW)
            .unwrap();
        let result = &report.result;

        assert_eq!(result.username, "sample_boutique");
        assert_eq!(result.metrics.engagement_rate, 1.8);
        assert_eq!(result.metrics.posting_frequency, PostingFrequency::Irregular);
        assert_eq!(result.metrics.days_since_last_post, Some(12));
        assert_eq!(
            result.issue_kinds(),
            vec![
                IssueKind::LowEngagement,
                IssueKind::IrregularPosting,
                IssueKind::InactiveAccount,
                IssueKind::FollowRatioImbalance,
            ]
        );
        assert_eq!(result.opportunity_score, 7.5);
        assert_eq!(result.growth_potential, GrowthPotential::Medium);
        assert_eq!(result.analyzed_at, NOW);
        assert!(!result.recommendations.is_empty());
        assert!(report.comparison.is_none());
    }

    #[test]
    fn test_healthy_account_is_low_for_the_healthy_reason() {
        let report = Analyzer::default().analyze(&healthy(), None, NOW).unwrap();
        let result = &report.result;

        assert_eq!(result.metrics.engagement_rate, 8.0);
        assert_eq!(result.metrics.posting_frequency, PostingFrequency::Daily);
        assert_eq!(result.metrics.days_since_last_post, Some(1));
        assert!((result.metrics.follower_ratio - 0.1).abs() < 1e-9);
        assert!(result.issues.is_empty());
        assert_eq!(
            result.recommendations,
            recommend::MAINTENANCE.map(String::from).to_vec()
        );
        assert_eq!(result.growth_potential, GrowthPotential::Low);
        assert_eq!(result.potential_reason, PotentialReason::Healthy);
    }

    #[test]
    fn test_zero_posts_zero_followers() {
        let mut snap = documented_sample();
        snap.followers = 0;
        snap.recent_posts.clear();

        let result = Analyzer::default().analyze(&snap, None, NOW).unwrap().result;
        assert_eq!(result.metrics.engagement_rate, 0.0);
        assert_eq!(result.metrics.posting_frequency, PostingFrequency::Inactive);
        assert_eq!(result.metrics.days_since_last_post, None);
        assert_eq!(result.potential_reason, PotentialReason::Dormant);
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn test_analysis_is_deterministic_apart_from_id() {
        let analyzer = Analyzer::default();
        let first = analyzer.analyze(&documented_sample(), None, NOW).unwrap().result;
        let mut second = analyzer.analyze(&documented_sample(), None, NOW).unwrap().result;

        assert_ne!(first.id, second.id);
        second.id = first.id;
        assert_eq!(first, second);
    }

    #[test]
    fn test_prior_result_produces_comparison() {
        let analyzer = Analyzer::default();
        let prior = analyzer
            .analyze(&documented_sample(), None, NOW)
            .unwrap()
            .result;

        let mut improved = documented_sample();
        improved.followers = 2600;
        improved.following = 900;
        let report = analyzer.analyze(&improved, Some(&prior), NOW).unwrap();
        let comparison = report.comparison.unwrap();

        // 7.5 -> 7.8 once the ratio issue is gone
        assert_eq!(comparison.follower_delta, 150);
        assert_eq!(comparison.score_delta, 0.3);
        assert_eq!(comparison.trend, Trend::Improving);
        assert!(comparison.new_issues.is_empty());
        assert_eq!(comparison.resolved_issues, vec![IssueKind::FollowRatioImbalance]);
    }

    #[test]
    fn test_invalid_snapshot_surfaces_unchanged() {
        let mut snap = documented_sample();
        snap.total_posts = -1;

        let err = Analyzer::default().analyze(&snap, None, NOW).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::NegativeCount {
                field: "total_posts".to_string(),
                value: -1,
            }
        );
    }

    #[test]
    fn test_injected_thresholds_change_the_outcome() {
        let mut config = AnalysisConfig::default();
        config.issues.dormancy_days = 30;
        config.issues.follower_ratio_ceiling = 2.0;

        let result = Analyzer::new(config)
            .analyze(&documented_sample(), None, NOW)
            .unwrap()
            .result;
        assert_eq!(
            result.issue_kinds(),
            vec![IssueKind::LowEngagement, IssueKind::IrregularPosting]
        );
        assert_eq!(result.opportunity_score, 8.5);
    }
}
