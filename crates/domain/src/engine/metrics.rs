//! Metric calculator

use time::OffsetDateTime;

use crate::model::{
    MediaType, Metrics, PostingFrequency, ProfileSnapshot, SnapshotError, ValidatedPost,
    ValidatedSnapshot,
};
use crate::round_to;
use crate::thresholds::CadenceThresholds;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Validate a raw snapshot and derive its metrics relative to `now`
pub fn compute_metrics(
    snapshot: &ProfileSnapshot,
    cadence: &CadenceThresholds,
    now: OffsetDateTime,
) -> Result<Metrics, SnapshotError> {
    let validated = snapshot.validate()?;
    Ok(metrics_from_validated(&validated, cadence, now))
}

/// Derive metrics from an already validated snapshot
pub fn metrics_from_validated(
    snapshot: &ValidatedSnapshot,
    cadence: &CadenceThresholds,
    now: OffsetDateTime,
) -> Metrics {
    let posts = &snapshot.posts;
    let sample_size = posts.len();

    let total_likes = posts.iter().fold(0u64, |acc, p| acc.saturating_add(p.likes));
    let total_comments = posts
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(p.comments));

    let (average_likes, average_comments) = if sample_size == 0 {
        (0.0, 0.0)
    } else {
        let n = sample_size as f64;
        (total_likes as f64 / n, total_comments as f64 / n)
    };

    let audience = snapshot.followers.max(1) as f64;
    let engagement_rate = round_to((average_likes + average_comments) / audience * 100.0, 1);

    let median_post_gap_days = median_gap_days(posts);
    let posting_frequency = match (sample_size, median_post_gap_days) {
        (0, _) => PostingFrequency::Inactive,
        (_, Some(gap)) => cadence.categorize(gap),
        // A lone post gives no gap to measure
        (_, None) => PostingFrequency::Irregular,
    };

    let days_since_last_post = posts
        .iter()
        .map(|p| p.posted_at)
        .max()
        .map(|latest| whole_days_between(latest, now));

    let videos = posts
        .iter()
        .filter(|p| p.media_type == MediaType::Video)
        .count();
    let video_share = if sample_size == 0 {
        0.0
    } else {
        videos as f64 / sample_size as f64
    };

    Metrics {
        engagement_rate,
        average_likes: round_to(average_likes, 1),
        average_comments: round_to(average_comments, 1),
        posting_frequency,
        median_post_gap_days: median_post_gap_days.map(|gap| round_to(gap, 1)),
        days_since_last_post,
        follower_ratio: snapshot.following as f64 / audience,
        comment_to_like_ratio: total_comments as f64 / total_likes.max(1) as f64,
        video_share,
        sample_size,
    }
}

/// Median gap in days between consecutive posts, ordered by time
fn median_gap_days(posts: &[ValidatedPost]) -> Option<f64> {
    let mut times: Vec<OffsetDateTime> = posts.iter().map(|p| p.posted_at).collect();
    times.sort();

    let mut gaps: Vec<f64> = times
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).as_seconds_f64() / SECONDS_PER_DAY)
        .collect();
    if gaps.is_empty() {
        return None;
    }

    gaps.sort_by(f64::total_cmp);
    let mid = gaps.len() / 2;
    let median = if gaps.len() % 2 == 0 {
        (gaps[mid - 1] + gaps[mid]) / 2.0
    } else {
        gaps[mid]
    };
    Some(median)
}

// Posts stamped after `now` (clock skew) count as zero days old
fn whole_days_between(earlier: OffsetDateTime, now: OffsetDateTime) -> u32 {
    let days = (now - earlier).whole_days().max(0);
    u32::try_from(days).unwrap_or(u32::MAX)
}
