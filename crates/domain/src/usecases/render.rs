//! Rendering use case - turns analyses into human-readable reports

use crate::model::{AnalysisRecord, AnalysisReport, AnalysisResult, HistoryComparison};
use crate::usecases::digest::Digest;

const RULE_WIDTH: usize = 60;

/// Configuration for the renderer
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Maximum issues listed (None = all)
    pub max_issues: Option<usize>,
    /// Maximum recommendations listed (None = all)
    pub max_recommendations: Option<usize>,
    /// Whether to include the ratio and cadence detail lines
    pub show_metrics: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_issues: None,
            max_recommendations: None,
            show_metrics: true,
        }
    }
}

/// Renderer for analysis reports
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Full text report for one analysis
    pub fn render_report(&self, report: &AnalysisReport) -> String {
        let result = &report.result;
        let metrics = &result.metrics;
        let rule = "=".repeat(RULE_WIDTH);
        let full_name = if result.full_name.is_empty() {
            "N/A"
        } else {
            result.full_name.as_str()
        };

        let mut lines = vec![
            rule.clone(),
            format!("ANALYSIS REPORT: @{}", result.username),
            rule.clone(),
        ];
        if report.cached {
            lines.push(format!(
                "(stored analysis from {})",
                result.analyzed_at.date()
            ));
        }

        lines.push("\nPROFILE STATS:".to_string());
        lines.push(format!("  Full Name: {full_name}"));
        lines.push(format!("  Followers: {}", group_thousands(result.followers)));
        lines.push(format!("  Following: {}", group_thousands(result.following)));
        lines.push(format!(
            "  Total Posts: {}",
            group_thousands(result.total_posts)
        ));
        lines.push(format!(
            "  Business Account: {}",
            if result.is_business { "Yes" } else { "No" }
        ));

        lines.push("\nENGAGEMENT METRICS:".to_string());
        lines.push(format!("  Engagement Rate: {:.1}%", metrics.engagement_rate));
        lines.push(format!("  Average Likes: {:.0}", metrics.average_likes));
        lines.push(format!("  Average Comments: {:.0}", metrics.average_comments));
        if self.config.show_metrics {
            lines.push(format!("  Follower Ratio: {:.2}", metrics.follower_ratio));
            lines.push(format!(
                "  Comment/Like Ratio: {:.3}",
                metrics.comment_to_like_ratio
            ));
            lines.push(format!("  Posts Sampled: {}", metrics.sample_size));
        }

        lines.push("\nACTIVITY:".to_string());
        lines.push(format!("  Posting Frequency: {}", metrics.posting_frequency));
        if self.config.show_metrics {
            if let Some(gap) = metrics.median_post_gap_days {
                lines.push(format!("  Median Gap: {gap:.1} days"));
            }
        }
        lines.push(format!("  Last Post: {}", last_post(result)));

        lines.push("\nOPPORTUNITY ASSESSMENT:".to_string());
        lines.push(format!(
            "  Growth Potential: {} ({})",
            result.growth_potential.as_str().to_uppercase(),
            result.potential_reason.as_str().replace('_', " ")
        ));
        lines.push(format!(
            "  Opportunity Score: {:.1}/10",
            result.opportunity_score
        ));

        lines.push("\nKEY ISSUES:".to_string());
        if result.issues.is_empty() {
            lines.push("  (none detected)".to_string());
        }
        lines.extend(numbered(
            limit(&result.issues, self.config.max_issues)
                .iter()
                .map(|issue| issue.detail.as_str()),
        ));

        lines.push("\nRECOMMENDATIONS:".to_string());
        lines.extend(numbered(
            limit(&result.recommendations, self.config.max_recommendations)
                .iter()
                .map(String::as_str),
        ));

        if let Some(comparison) = &report.comparison {
            lines.extend(self.comparison_lines(comparison));
        }

        lines.push(format!("\n{rule}"));
        lines.join("\n") + "\n"
    }

    fn comparison_lines(&self, comparison: &HistoryComparison) -> Vec<String> {
        let mut lines = vec![
            format!(
                "\nTREND (since {}):",
                comparison.previous_analyzed_at.date()
            ),
            format!(
                "  Direction: {}",
                comparison.trend.as_str().to_uppercase()
            ),
            format!("  Followers: {:+}", comparison.follower_delta),
            format!(
                "  Engagement Rate: {:+.2} pts",
                comparison.engagement_rate_delta
            ),
            format!("  Score: {:+.1}", comparison.score_delta),
        ];
        if !comparison.new_issues.is_empty() {
            lines.push(format!("  New Issues: {}", join(&comparison.new_issues)));
        }
        if !comparison.resolved_issues.is_empty() {
            lines.push(format!(
                "  Resolved Issues: {}",
                join(&comparison.resolved_issues)
            ));
        }
        lines
    }

    /// Ranked listing of recent uncontacted opportunities
    pub fn render_digest(&self, digest: &Digest) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut lines = vec![
            rule.clone(),
            format!("OPPORTUNITIES REPORT - {}", digest.generated_at.date()),
            rule.clone(),
        ];

        if digest.entries.is_empty() {
            lines.push(format!(
                "No new opportunities since {}.",
                digest.since.date()
            ));
        } else {
            lines.push(format!(
                "Found {} uncontacted opportunities scoring {:.1}+ since {}:",
                digest.entries.len(),
                digest.min_score,
                digest.since.date()
            ));
            for (i, record) in digest.entries.iter().enumerate() {
                let result = &record.result;
                let top_issues: Vec<&str> = result
                    .issues
                    .iter()
                    .take(2)
                    .map(|issue| issue.detail.as_str())
                    .collect();
                lines.push(String::new());
                lines.push(self.render_opportunity(record, i + 1));
                if !top_issues.is_empty() {
                    lines.push(format!("     Top issues: {}", top_issues.join("; ")));
                }
            }
        }

        lines.push(rule);
        lines.join("\n") + "\n"
    }

    /// One line per stored opportunity, for ranked listings
    pub fn render_opportunity(&self, record: &AnalysisRecord, rank: usize) -> String {
        let result = &record.result;
        let status = match (record.outreach.converted, record.outreach.contacted) {
            (true, _) => " [converted]",
            (false, true) => " [contacted]",
            (false, false) => "",
        };
        format!(
            "{rank:>3}. @{:<30} {:>4.1}/10  {:<6}  {:>9} followers  {:>5.1}% ER  {} issue(s){status}",
            result.username,
            result.opportunity_score,
            result.growth_potential.as_str(),
            group_thousands(result.followers),
            result.metrics.engagement_rate,
            result.issues.len(),
        )
    }

    /// One line per past analysis, newest first
    pub fn render_history_line(&self, result: &AnalysisResult) -> String {
        format!(
            "{}  score {:>4.1}  {:<6}  {:>9} followers  {:>5.1}% ER",
            result.analyzed_at.date(),
            result.opportunity_score,
            result.growth_potential.as_str(),
            group_thousands(result.followers),
            result.metrics.engagement_rate,
        )
    }
}

fn last_post(result: &AnalysisResult) -> String {
    match result.metrics.days_since_last_post {
        Some(0) => "today".to_string(),
        Some(1) => "1 day ago".to_string(),
        Some(days) => format!("{days} days ago"),
        None => "unknown (no posts sampled)".to_string(),
    }
}

fn numbered<'a>(items: impl Iterator<Item = &'a str>) -> impl Iterator<Item = String> {
    items
        .enumerate()
        .map(|(i, item)| format!("  {}. {}", i + 1, item))
}

fn limit<T>(items: &[T], max: Option<usize>) -> &[T] {
    match max {
        Some(max) if max < items.len() => &items[..max],
        _ => items,
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Analyzer;
    use crate::model::{IssueKind, OutreachStatus, Trend};
    use crate::usecases::testing::{NOW, sample_snapshot};

    fn report() -> AnalysisReport {
        Analyzer::default()
            .analyze(&sample_snapshot("cafe_roma", 2450), None, NOW)
            .unwrap()
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(2_450), "2,450");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_report_contains_sections() {
        let text = Renderer::new(RenderConfig::default()).render_report(&report());

        assert!(text.contains("ANALYSIS REPORT: @cafe_roma"));
        assert!(text.contains("Followers: 2,450"));
        assert!(text.contains("Engagement Rate: 1.8%"));
        assert!(text.contains("Posting Frequency: irregular"));
        assert!(text.contains("Last Post: 12 days ago"));
        assert!(text.contains("Growth Potential: MEDIUM (moderate)"));
        assert!(text.contains("Opportunity Score: 7.5/10"));
        assert!(text.contains("1. Low engagement rate (1.8%)"));
        assert!(!text.contains("TREND"));
    }

    #[test]
    fn test_caps_limit_listed_items() {
        let config = RenderConfig {
            max_issues: Some(1),
            max_recommendations: Some(2),
            show_metrics: false,
        };
        let text = Renderer::new(config).render_report(&report());

        assert!(text.contains("  1. Low engagement"));
        assert!(!text.contains("  2. Inconsistent posting"));
        assert!(!text.contains("Follower Ratio"));
        let recs = text.split("RECOMMENDATIONS:").nth(1).unwrap();
        assert!(recs.contains("  2. "));
        assert!(!recs.contains("  3. "));
    }

    #[test]
    fn test_trend_section_when_compared() {
        let mut report = report();
        report.comparison = Some(HistoryComparison {
            follower_delta: 150,
            engagement_rate_delta: -0.25,
            score_delta: 0.3,
            trend: Trend::Improving,
            new_issues: vec![],
            resolved_issues: vec![IssueKind::FollowRatioImbalance],
            previous_analyzed_at: NOW,
        });

        let text = Renderer::new(RenderConfig::default()).render_report(&report);
        assert!(text.contains("TREND (since 2024-06-01):"));
        assert!(text.contains("Direction: IMPROVING"));
        assert!(text.contains("Followers: +150"));
        assert!(text.contains("Engagement Rate: -0.25 pts"));
        assert!(text.contains("Resolved Issues: follow-ratio-imbalance"));
        assert!(!text.contains("New Issues"));
    }

    #[test]
    fn test_opportunity_line_shows_outreach_status() {
        let record = AnalysisRecord {
            result: report().result,
            outreach: OutreachStatus {
                contacted: true,
                ..Default::default()
            },
        };
        let line = Renderer::new(RenderConfig::default()).render_opportunity(&record, 1);

        assert!(line.starts_with("  1. @cafe_roma"));
        assert!(line.contains("7.5/10"));
        assert!(line.contains("2,450 followers"));
        assert!(line.ends_with("[contacted]"));
    }

    #[test]
    fn test_report_ends_with_rule_and_notes_stored_analysis() {
        let mut report = report();
        let renderer = Renderer::new(RenderConfig::default());

        let fresh = renderer.render_report(&report);
        assert!(fresh.ends_with(&format!("{}\n", "=".repeat(RULE_WIDTH))));
        assert!(!fresh.contains("stored analysis"));

        report.cached = true;
        let stored = renderer.render_report(&report);
        assert!(stored.contains("(stored analysis from 2024-06-01)"));
    }

    #[test]
    fn test_digest_lists_ranked_entries_with_top_issues() {
        let digest = Digest {
            generated_at: NOW,
            since: NOW - time::Duration::days(7),
            min_score: 6.0,
            entries: vec![AnalysisRecord {
                result: report().result,
                outreach: OutreachStatus::default(),
            }],
        };

        let text = Renderer::new(RenderConfig::default()).render_digest(&digest);
        assert!(text.contains("OPPORTUNITIES REPORT - 2024-06-01"));
        assert!(text.contains("Found 1 uncontacted opportunities scoring 6.0+ since 2024-05-25:"));
        assert!(text.contains("  1. @cafe_roma"));
        assert!(text.contains("Top issues: Low engagement rate (1.8%)"));

        let empty = Digest {
            entries: vec![],
            ..digest
        };
        let text = Renderer::new(RenderConfig::default()).render_digest(&empty);
        assert!(text.contains("No new opportunities since 2024-05-25."));
    }

    #[test]
    fn test_unknown_recency_is_labelled() {
        let mut snapshot = sample_snapshot("cafe_roma", 2450);
        snapshot.recent_posts.clear();
        let report = Analyzer::default().analyze(&snapshot, None, NOW).unwrap();

        let text = Renderer::new(RenderConfig::default()).render_report(&report);
        assert!(text.contains("Last Post: unknown (no posts sampled)"));
    }
}
