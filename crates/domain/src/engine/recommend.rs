//! Recommendation generator

use crate::model::{Issue, IssueKind, Metrics, PostingFrequency};

/// Below this share of video posts, low engagement also suggests short-form video
pub const REELS_VIDEO_SHARE: f64 = 0.25;

const REELS_SUGGESTION: &str =
    "Test short-form video (reels) - video posts are underrepresented in recent content";

/// Suggestions for an account with nothing wrong
pub const MAINTENANCE: [&str; 3] = [
    "Keep the current posting cadence and monitor engagement weekly",
    "Optimize posting times based on when followers are most active",
    "Invest in high-quality visual content - use professional photography/videography",
];

/// Map issues to recommendation text, following issue priority order.
///
/// Each issue kind contributes its templates once, even if the input repeats
/// it. An empty issue list yields [`MAINTENANCE`], so the output is never empty.
pub fn recommend(issues: &[Issue], metrics: &Metrics) -> Vec<String> {
    let mut kinds: Vec<IssueKind> = issues.iter().map(|issue| issue.kind).collect();
    kinds.sort();
    kinds.dedup();

    if kinds.is_empty() {
        return MAINTENANCE.iter().map(|s| s.to_string()).collect();
    }

    let mut out: Vec<String> = Vec::new();
    for kind in kinds {
        for text in templates(kind, metrics) {
            if !out.iter().any(|existing| existing == text) {
                out.push(text.to_string());
            }
        }
    }
    out
}

fn templates(kind: IssueKind, metrics: &Metrics) -> Vec<&'static str> {
    match kind {
        IssueKind::LowEngagement => {
            let mut texts = vec![
                "Implement strategic hashtag research and use 20-30 relevant hashtags per post",
                "Analyze top-performing posts and replicate successful content themes",
            ];
            if metrics.sample_size > 0 && metrics.video_share < REELS_VIDEO_SHARE {
                texts.push(REELS_SUGGESTION);
            }
            texts
        }
        IssueKind::IrregularPosting => match metrics.posting_frequency {
            PostingFrequency::Inactive => vec![
                "Restart publishing with a simple weekly content calendar before increasing volume",
            ],
            _ => vec!["Establish a consistent posting schedule - aim for 4-5 posts per week minimum"],
        },
        IssueKind::InactiveAccount => {
            vec!["Resume regular posting immediately to re-engage the dormant audience"]
        }
        IssueKind::FollowRatioImbalance => vec![
            "Unfollow inactive and irrelevant accounts to bring following below follower count",
        ],
        IssueKind::LowCommunityEngagement => vec![
            "Create content that encourages conversation - ask questions, run polls, reply to comments",
        ],
        IssueKind::LimitedContent => vec![
            "Build out the content library with evergreen posts that showcase products and services",
        ],
        IssueKind::IncompleteBio => vec![
            "Complete the bio with a clear value proposition, contact details and a call to action",
        ],
    }
}
