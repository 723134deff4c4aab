//! Issue detector
//!
//! Each rule is an independent predicate over the metrics and a few snapshot
//! fields. Rules are not mutually exclusive; the detector runs all of them and
//! returns the hits in [`IssueKind`] priority order.

use crate::model::{Issue, IssueKind, Metrics, PostingFrequency, ValidatedSnapshot};
use crate::thresholds::IssueThresholds;

/// Signature shared by every detection rule
pub type Rule = fn(&Metrics, &ValidatedSnapshot, &IssueThresholds) -> Option<Issue>;

/// All rules, in priority order
pub const RULES: [Rule; 7] = [
    low_engagement,
    irregular_posting,
    inactive_account,
    follow_ratio_imbalance,
    low_community_engagement,
    limited_content,
    incomplete_bio,
];

/// Run every rule and collect the issues in priority order
pub fn detect_issues(
    metrics: &Metrics,
    snapshot: &ValidatedSnapshot,
    thresholds: &IssueThresholds,
) -> Vec<Issue> {
    let mut issues: Vec<Issue> = RULES
        .iter()
        .filter_map(|rule| rule(metrics, snapshot, thresholds))
        .collect();
    issues.sort_by_key(|issue| issue.kind);

    tracing::trace!(
        username = %snapshot.username,
        issues = ?issues.iter().map(|i| i.kind).collect::<Vec<_>>(),
        "Detected issues"
    );

    issues
}

pub fn low_engagement(
    metrics: &Metrics,
    snapshot: &ValidatedSnapshot,
    thresholds: &IssueThresholds,
) -> Option<Issue> {
    if metrics.engagement_rate >= thresholds.engagement_floor_pct
        || snapshot.followers < thresholds.engagement_min_followers
    {
        return None;
    }
    Some(Issue {
        kind: IssueKind::LowEngagement,
        detail: format!(
            "Low engagement rate ({:.1}%) - audience not interacting with content",
            metrics.engagement_rate
        ),
    })
}

pub fn irregular_posting(
    metrics: &Metrics,
    _snapshot: &ValidatedSnapshot,
    _thresholds: &IssueThresholds,
) -> Option<Issue> {
    let detail = match (metrics.posting_frequency, metrics.median_post_gap_days) {
        (PostingFrequency::Inactive, _) => {
            "No steady posting cadence - content output has effectively stopped".to_string()
        }
        (PostingFrequency::Irregular, Some(gap)) => format!(
            "Inconsistent posting schedule (median gap {:.1} days) - losing audience interest",
            gap
        ),
        (PostingFrequency::Irregular, None) => {
            "Inconsistent posting schedule - losing audience interest".to_string()
        }
        _ => return None,
    };
    Some(Issue {
        kind: IssueKind::IrregularPosting,
        detail,
    })
}

/// Unknown recency (no posts) never triggers this rule
pub fn inactive_account(
    metrics: &Metrics,
    _snapshot: &ValidatedSnapshot,
    thresholds: &IssueThresholds,
) -> Option<Issue> {
    let days = metrics.days_since_last_post?;
    if days <= thresholds.dormancy_days {
        return None;
    }
    Some(Issue {
        kind: IssueKind::InactiveAccount,
        detail: format!("Inactive account - last post was {} days ago", days),
    })
}

pub fn follow_ratio_imbalance(
    metrics: &Metrics,
    _snapshot: &ValidatedSnapshot,
    thresholds: &IssueThresholds,
) -> Option<Issue> {
    if metrics.follower_ratio <= thresholds.follower_ratio_ceiling {
        return None;
    }
    Some(Issue {
        kind: IssueKind::FollowRatioImbalance,
        detail: format!(
            "Following too many accounts compared to followers (ratio {:.2})",
            metrics.follower_ratio
        ),
    })
}

/// Needs at least one sampled post
pub fn low_community_engagement(
    metrics: &Metrics,
    _snapshot: &ValidatedSnapshot,
    thresholds: &IssueThresholds,
) -> Option<Issue> {
    if metrics.sample_size == 0 || metrics.comment_to_like_ratio >= thresholds.comment_to_like_floor
    {
        return None;
    }
    Some(Issue {
        kind: IssueKind::LowCommunityEngagement,
        detail: format!(
            "Very low comment-to-like ratio ({:.3}) - weak community engagement",
            metrics.comment_to_like_ratio
        ),
    })
}

pub fn limited_content(
    _metrics: &Metrics,
    snapshot: &ValidatedSnapshot,
    thresholds: &IssueThresholds,
) -> Option<Issue> {
    if snapshot.total_posts >= thresholds.min_total_posts {
        return None;
    }
    Some(Issue {
        kind: IssueKind::LimitedContent,
        detail: format!(
            "Limited content library - only {} posts published",
            snapshot.total_posts
        ),
    })
}

pub fn incomplete_bio(
    _metrics: &Metrics,
    snapshot: &ValidatedSnapshot,
    thresholds: &IssueThresholds,
) -> Option<Issue> {
    if snapshot.biography.trim().chars().count() >= thresholds.min_bio_chars {
        return None;
    }
    Some(Issue {
        kind: IssueKind::IncompleteBio,
        detail: "Incomplete bio - profile does not say what the account offers".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn metrics() -> Metrics {
        Metrics {
            engagement_rate: 8.0,
            average_likes: 75.0,
            average_comments: 5.0,
            posting_frequency: PostingFrequency::Daily,
            median_post_gap_days: Some(1.0),
            days_since_last_post: Some(1),
            follower_ratio: 0.1,
            comment_to_like_ratio: 0.07,
            video_share: 0.5,
            sample_size: 12,
        }
    }

    fn snapshot() -> ValidatedSnapshot {
        ValidatedSnapshot {
            username: "healthy_brand".to_string(),
            full_name: "Healthy Brand".to_string(),
            biography: "Daily recipes and kitchen tips".to_string(),
            followers: 1000,
            following: 100,
            total_posts: 400,
            is_business: true,
            is_verified: false,
            posts: vec![],
            captured_at: datetime!(2024-06-01 12:00 UTC),
        }
    }

    fn kinds(issues: &[Issue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_healthy_account_has_no_issues() {
        let issues = detect_issues(&metrics(), &snapshot(), &IssueThresholds::default());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_low_engagement_requires_minimum_audience() {
        let thresholds = IssueThresholds::default();
        let m = Metrics {
            engagement_rate: 1.0,
            ..metrics()
        };
        let mut snap = snapshot();

        assert!(low_engagement(&m, &snap, &thresholds).is_some());

        snap.followers = 99;
        assert!(low_engagement(&m, &snap, &thresholds).is_none());
    }

    #[test]
    fn test_low_engagement_floor_is_exclusive() {
        let m = Metrics {
            engagement_rate: 3.0,
            ..metrics()
        };
        assert!(low_engagement(&m, &snapshot(), &IssueThresholds::default()).is_none());
    }

    #[test]
    fn test_irregular_posting_covers_irregular_and_inactive() {
        let thresholds = IssueThresholds::default();
        for (frequency, expected) in [
            (PostingFrequency::Daily, false),
            (PostingFrequency::Frequent, false),
            (PostingFrequency::Weekly, false),
            (PostingFrequency::Irregular, true),
            (PostingFrequency::Inactive, true),
        ] {
            let m = Metrics {
                posting_frequency: frequency,
                ..metrics()
            };
            assert_eq!(
                irregular_posting(&m, &snapshot(), &thresholds).is_some(),
                expected,
                "{:?}",
                frequency
            );
        }
    }

    #[test]
    fn test_inactive_account_threshold() {
        let thresholds = IssueThresholds::default();
        let at_threshold = Metrics {
            days_since_last_post: Some(7),
            ..metrics()
        };
        let past_threshold = Metrics {
            days_since_last_post: Some(8),
            ..metrics()
        };

        assert!(inactive_account(&at_threshold, &snapshot(), &thresholds).is_none());
        let issue = inactive_account(&past_threshold, &snapshot(), &thresholds).unwrap();
        assert_eq!(issue.detail, "Inactive account - last post was 8 days ago");
    }

    #[test]
    fn test_unknown_recency_is_not_inactive() {
        let m = Metrics {
            days_since_last_post: None,
            ..metrics()
        };
        assert!(inactive_account(&m, &snapshot(), &IssueThresholds::default()).is_none());
    }

    #[test]
    fn test_follow_ratio_imbalance() {
        let thresholds = IssueThresholds::default();
        let balanced = Metrics {
            follower_ratio: 1.0,
            ..metrics()
        };
        let imbalanced = Metrics {
            follower_ratio: 1.31,
            ..metrics()
        };

        assert!(follow_ratio_imbalance(&balanced, &snapshot(), &thresholds).is_none());
        assert!(follow_ratio_imbalance(&imbalanced, &snapshot(), &thresholds).is_some());
    }

    #[test]
    fn test_low_community_engagement_skips_empty_sample() {
        let thresholds = IssueThresholds::default();
        let quiet = Metrics {
            comment_to_like_ratio: 0.01,
            ..metrics()
        };
        let empty = Metrics {
            comment_to_like_ratio: 0.0,
            sample_size: 0,
            ..metrics()
        };

        assert!(low_community_engagement(&quiet, &snapshot(), &thresholds).is_some());
        assert!(low_community_engagement(&empty, &snapshot(), &thresholds).is_none());
    }

    #[test]
    fn test_limited_content_and_incomplete_bio_use_snapshot_fields() {
        let thresholds = IssueThresholds::default();
        let mut snap = snapshot();
        snap.total_posts = 12;
        snap.biography = "   ".to_string();

        let issues = detect_issues(&metrics(), &snap, &thresholds);
        assert_eq!(
            kinds(&issues),
            vec![IssueKind::LimitedContent, IssueKind::IncompleteBio]
        );
    }

    #[test]
    fn test_issues_are_returned_in_priority_order() {
        let m = Metrics {
            engagement_rate: 0.5,
            posting_frequency: PostingFrequency::Irregular,
            days_since_last_post: Some(20),
            follower_ratio: 2.0,
            comment_to_like_ratio: 0.001,
            ..metrics()
        };
        let mut snap = snapshot();
        snap.total_posts = 3;
        snap.biography.clear();

        let issues = detect_issues(&m, &snap, &IssueThresholds::default());
        assert_eq!(kinds(&issues), IssueKind::ALL.to_vec());
    }

    #[test]
    fn test_thresholds_are_injectable() {
        let m = Metrics {
            days_since_last_post: Some(10),
            ..metrics()
        };
        let relaxed = IssueThresholds {
            dormancy_days: 14,
            ..Default::default()
        };

        assert!(inactive_account(&m, &snapshot(), &IssueThresholds::default()).is_some());
        assert!(inactive_account(&m, &snapshot(), &relaxed).is_none());
    }
}
