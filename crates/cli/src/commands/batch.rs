//! Batch command - analyze a list of usernames

use anyhow::{Context, Result, bail};
use profile_scout_adapters::export::JsonlReportLog;
use profile_scout_domain::usecases::{
    BatchAnalyzer, BatchConfig, BatchEntry, BatchOutcome, BatchSummary,
};
use profile_scout_domain::{AnalysisReport, AnalysisStore, Clock, ProfileSource};
use serde::Serialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::args::BatchArgs;
use crate::commands::analyze::{
    CliUseCase, build_source, build_usecase, open_store, with_freshness,
};
use crate::config::AppConfig;

pub async fn execute(args: BatchArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let usernames = read_usernames(&args.file)?;

    let usecase = build_usecase(&config, build_source(&config)?, open_store(&config).await?)?;
    let batch = build_batch(&config, with_freshness(usecase, &config, args.force));

    let entries = batch.run(&usernames).await?;

    if let Some(path) = &args.log {
        append_to_log(path, &entries).await?;
    }

    let summary = BatchSummary::from_entries(&entries, args.min_score);

    if args.json {
        let output = BatchOutput {
            summary: SummaryOutput::from(summary),
            results: entries.iter().map(EntryOutput::from).collect(),
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        print_entries(&entries, args.min_score);
        println!();
        println!(
            "Analyzed: {}  Failed: {}  Opportunities (score >= {:.1}): {}",
            summary.analyzed, summary.failed, args.min_score, summary.flagged
        );
    }

    if summary.analyzed == 0 {
        bail!("Every analysis in the batch failed");
    }

    Ok(())
}

pub type CliBatch = BatchAnalyzer<dyn ProfileSource, dyn AnalysisStore, dyn Clock>;

pub fn build_batch(config: &AppConfig, usecase: CliUseCase) -> CliBatch {
    let (rate_limit_per_minute, rate_limit_per_hour) = config.general.rate_limits();
    BatchAnalyzer::new(
        Arc::new(usecase),
        BatchConfig {
            max_concurrent: config.general.max_concurrent,
            rate_limit_per_minute,
            rate_limit_per_hour,
        },
    )
}

pub async fn append_to_log(path: &Path, entries: &[BatchEntry]) -> Result<()> {
    let log = JsonlReportLog::new(path.to_path_buf())
        .await
        .with_context(|| format!("Failed to open report log: {}", path.display()))?;
    for report in entries.iter().filter_map(|entry| entry.outcome.report()) {
        log.append(report)
            .await
            .with_context(|| format!("Failed to write report log: {}", path.display()))?;
    }
    Ok(())
}

/// One username per line; blank lines and `#` comments are skipped
fn read_usernames(path: &Path) -> Result<Vec<String>> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read usernames from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read usernames: {}", path.display()))?
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

fn print_entries(entries: &[BatchEntry], min_score: f64) {
    let total = entries.len();
    for (i, entry) in entries.iter().enumerate() {
        match &entry.outcome {
            BatchOutcome::Analyzed(report) => {
                let result = &report.result;
                let flag = if result.opportunity_score >= min_score {
                    "  <- opportunity"
                } else {
                    ""
                };
                println!(
                    "[{}/{}] @{:<30} score {:>4.1}  {:<6}  {:>5.1}% ER{}",
                    i + 1,
                    total,
                    result.username,
                    result.opportunity_score,
                    result.growth_potential.as_str(),
                    result.metrics.engagement_rate,
                    flag
                );
            }
            BatchOutcome::Failed { error, transient } => {
                let hint = if *transient { " (retry later)" } else { "" };
                println!("[{}/{}] @{}  failed: {}{}", i + 1, total, entry.username, error, hint);
            }
        }
    }
}

#[derive(Serialize)]
struct BatchOutput<'a> {
    summary: SummaryOutput,
    results: Vec<EntryOutput<'a>>,
}

#[derive(Serialize)]
struct SummaryOutput {
    analyzed: usize,
    failed: usize,
    flagged: usize,
}

impl From<BatchSummary> for SummaryOutput {
    fn from(summary: BatchSummary) -> Self {
        Self {
            analyzed: summary.analyzed,
            failed: summary.failed,
            flagged: summary.flagged,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum EntryOutput<'a> {
    Analyzed {
        username: &'a str,
        report: &'a AnalysisReport,
    },
    Failed {
        username: &'a str,
        error: &'a str,
        transient: bool,
    },
}

impl<'a> From<&'a BatchEntry> for EntryOutput<'a> {
    fn from(entry: &'a BatchEntry) -> Self {
        match &entry.outcome {
            BatchOutcome::Analyzed(report) => Self::Analyzed {
                username: &entry.username,
                report,
            },
            BatchOutcome::Failed { error, transient } => Self::Failed {
                username: &entry.username,
                error,
                transient: *transient,
            },
        }
    }
}
