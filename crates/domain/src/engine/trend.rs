//! Trend comparator

use crate::model::{AnalysisResult, HistoryComparison, IssueKind, Trend};
use crate::round_to;

/// Compare an analysis against the subject's prior one.
///
/// Returns `None` when there is no prior result, or when the prior belongs to
/// a different subject.
pub fn compare(
    current: &AnalysisResult,
    prior: Option<&AnalysisResult>,
    epsilon: f64,
) -> Option<HistoryComparison> {
    let prior = prior?;
    if prior.username != current.username {
        tracing::warn!(
            current = %current.username,
            prior = %prior.username,
            "Ignoring prior analysis of a different subject"
        );
        return None;
    }

    let score_delta = round_to(current.opportunity_score - prior.opportunity_score, 1);
    let trend = classify(score_delta, epsilon);

    let current_kinds = current.issue_kinds();
    let prior_kinds = prior.issue_kinds();

    Some(HistoryComparison {
        follower_delta: signed_delta(current.followers, prior.followers),
        engagement_rate_delta: round_to(
            current.metrics.engagement_rate - prior.metrics.engagement_rate,
            2,
        ),
        score_delta,
        trend,
        new_issues: difference(&current_kinds, &prior_kinds),
        resolved_issues: difference(&prior_kinds, &current_kinds),
        previous_analyzed_at: prior.analyzed_at,
    })
}

/// Deltas strictly beyond +/- epsilon count as movement
pub fn classify(score_delta: f64, epsilon: f64) -> Trend {
    if score_delta > epsilon {
        Trend::Improving
    } else if score_delta < -epsilon {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn signed_delta(current: u64, prior: u64) -> i64 {
    let current = i64::try_from(current).unwrap_or(i64::MAX);
    let prior = i64::try_from(prior).unwrap_or(i64::MAX);
    current.saturating_sub(prior)
}

fn difference(left: &[IssueKind], right: &[IssueKind]) -> Vec<IssueKind> {
    let mut out: Vec<IssueKind> = left
        .iter()
        .copied()
        .filter(|kind| !right.contains(kind))
        .collect();
    out.sort();
    out.dedup();
    out
}
