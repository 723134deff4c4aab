//! Watch command - scheduled re-analysis of the configured usernames

use anyhow::{Result, bail};
use profile_scout_domain::AnalysisStore;
use profile_scout_domain::usecases::{BatchOutcome, BatchSummary, DigestConfig};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, interval, interval_at};

use crate::args::WatchArgs;
use crate::commands::analyze::{build_source, build_usecase, open_store};
use crate::commands::batch::{CliBatch, append_to_log, build_batch};
use crate::commands::report;
use crate::config::AppConfig;

pub async fn execute(args: WatchArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    if config.watch.usernames.is_empty() {
        bail!("No usernames configured under [watch].usernames");
    }

    tracing::info!(
        once = args.once,
        usernames = ?config.watch.usernames,
        poll_interval_secs = config.watch.poll_interval_secs,
        report_interval_secs = config.watch.report_interval_secs,
        min_score = config.watch.min_score,
        "Starting profile-scout watch"
    );

    let store = open_store(&config).await?;
    let usecase = build_usecase(&config, build_source(&config)?, Arc::clone(&store))?;
    let batch = build_batch(&config, usecase);

    if args.once {
        tracing::info!("Running single analysis cycle");
        run_cycle(&batch, &config).await?;
        if config.watch.report_interval().is_some() {
            run_report(&store).await?;
        }
    } else {
        let poll_interval = Duration::from_secs(config.watch.poll_interval_secs.max(1));
        let mut ticker = interval(poll_interval);
        // The first report is due one full period after start
        let mut report_ticker = config
            .watch
            .report_interval()
            .map(|period| interval_at(Instant::now() + period, period));

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        };

        tokio::pin!(shutdown);

        loop {
            let job = tokio::select! {
                _ = ticker.tick() => Job::Cycle,
                _ = next_tick(report_ticker.as_mut()) => Job::Report,
                _ = &mut shutdown => break,
            };

            let job_run = run_job(job, &batch, &store, &config);
            let Some(outcome) = unless_shutdown(job_run, shutdown.as_mut()).await else {
                tracing::info!(job = ?job, "Abandoning in-flight job");
                break;
            };
            if let Err(e) = outcome {
                tracing::error!(error = %e, job = ?job, "Scheduled job failed");
            }
        }
        tracing::info!("Shutting down gracefully");
    }

    tracing::info!("profile-scout watch completed");
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Job {
    Cycle,
    Report,
}

async fn run_job(
    job: Job,
    batch: &CliBatch,
    store: &Arc<dyn AnalysisStore>,
    config: &AppConfig,
) -> Result<()> {
    match job {
        Job::Cycle => run_cycle(batch, config).await.map(drop),
        Job::Report => run_report(store).await,
    }
}

/// `None` when `shutdown` fires before `job` finishes
async fn unless_shutdown<T>(
    job: impl Future<Output = T>,
    shutdown: Pin<&mut impl Future<Output = ()>>,
) -> Option<T> {
    tokio::select! {
        output = job => Some(output),
        _ = shutdown => None,
    }
}

/// Never resolves when the report is disabled
async fn next_tick(ticker: Option<&mut tokio::time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn run_report(store: &Arc<dyn AnalysisStore>) -> Result<()> {
    let digest = report::build_digest(Arc::clone(store), DigestConfig::default()).await?;
    print!("{}", report::render(&digest));
    Ok(())
}

async fn run_cycle(batch: &CliBatch, config: &AppConfig) -> Result<BatchSummary> {
    let entries = batch.run(&config.watch.usernames).await?;

    if let Some(path) = &config.watch.log_path {
        append_to_log(path, &entries).await?;
    }

    for entry in &entries {
        match &entry.outcome {
            BatchOutcome::Analyzed(report) => {
                let result = &report.result;
                if result.opportunity_score >= config.watch.min_score {
                    tracing::info!(
                        username = %result.username,
                        score = result.opportunity_score,
                        potential = %result.growth_potential,
                        trend = ?report.comparison.as_ref().map(|c| c.trend),
                        "Opportunity flagged"
                    );
                }
            }
            BatchOutcome::Failed { error, transient } => {
                tracing::warn!(
                    username = %entry.username,
                    error = %error,
                    transient = transient,
                    "Re-analysis failed"
                );
            }
        }
    }

    let summary = BatchSummary::from_entries(&entries, config.watch.min_score);
    tracing::info!(
        analyzed = summary.analyzed,
        failed = summary.failed,
        flagged = summary.flagged,
        "Analysis cycle complete"
    );
    println!(
        "Cycle complete: analyzed {}, failed {}, flagged {}",
        summary.analyzed, summary.failed, summary.flagged
    );

    Ok(summary)
}
