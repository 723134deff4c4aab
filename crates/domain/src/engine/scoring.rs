//! Opportunity scorer
//!
//! The score is `baseline - penalty`, clamped to 1..=10 and rounded to one
//! decimal. The baseline measures what the account would be worth if its issues
//! were fixed; the penalty sums one weight per distinct issue kind.

use std::collections::BTreeSet;

use crate::model::{
    Issue, IssueKind, Metrics, OpportunityAssessment, PotentialReason, ScoreBreakdown,
    ValidatedSnapshot,
};
use crate::round_to;
use crate::thresholds::ScoringWeights;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;

/// Snapshot fields the baseline is built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSubstance {
    pub followers: u64,
    pub total_posts: u64,
    pub is_business: bool,
}

impl From<&ValidatedSnapshot> for AccountSubstance {
    fn from(snapshot: &ValidatedSnapshot) -> Self {
        Self {
            followers: snapshot.followers,
            total_posts: snapshot.total_posts,
            is_business: snapshot.is_business,
        }
    }
}

/// Value of the account if every issue were fixed
pub fn baseline(metrics: &Metrics, substance: &AccountSubstance, weights: &ScoringWeights) -> f64 {
    let business = if substance.is_business {
        weights.business_bonus
    } else {
        0.0
    };
    weights.base_points
        + weights.follower_points(substance.followers)
        + weights.content_points(substance.total_posts)
        + weights.activity_points(metrics.days_since_last_post)
        + business
}

/// Sum of penalties, counting each issue kind once
pub fn penalty(issues: &[Issue], weights: &ScoringWeights) -> f64 {
    issues
        .iter()
        .map(|issue| issue.kind)
        .collect::<BTreeSet<IssueKind>>()
        .into_iter()
        .map(|kind| weights.penalties.for_issue(kind))
        .sum()
}

pub fn score(
    metrics: &Metrics,
    substance: &AccountSubstance,
    issues: &[Issue],
    weights: &ScoringWeights,
) -> OpportunityAssessment {
    let breakdown = ScoreBreakdown {
        baseline: baseline(metrics, substance, weights),
        penalty: penalty(issues, weights),
    };
    let score = round_to(
        (breakdown.baseline - breakdown.penalty).clamp(MIN_SCORE, MAX_SCORE),
        1,
    );
    let reason = classify(metrics, issues, &breakdown, weights);

    tracing::debug!(
        score,
        baseline = breakdown.baseline,
        penalty = breakdown.penalty,
        reason = reason.as_str(),
        "Scored account"
    );

    OpportunityAssessment {
        score,
        potential: reason.potential(),
        reason,
        breakdown,
    }
}

fn classify(
    metrics: &Metrics,
    issues: &[Issue],
    breakdown: &ScoreBreakdown,
    weights: &ScoringWeights,
) -> PotentialReason {
    if issues.is_empty() || breakdown.penalty <= weights.negligible_penalty {
        return PotentialReason::Healthy;
    }
    let dormant = metrics
        .days_since_last_post
        .is_none_or(|days| days > weights.dormant_after_days);
    if dormant {
        return PotentialReason::Dormant;
    }
    if breakdown.baseline < weights.weak_baseline {
        return PotentialReason::TooSmall;
    }
    if breakdown.baseline >= weights.strong_baseline && breakdown.penalty >= weights.high_penalty {
        return PotentialReason::RoomToImprove;
    }
    PotentialReason::Moderate
}
