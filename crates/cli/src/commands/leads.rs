//! Lead commands - ranked opportunities, history and outreach tracking

use anyhow::{Context, Result, bail};
use profile_scout_domain::usecases::{RenderConfig, Renderer};
use profile_scout_domain::{AnalysisStore, normalize_username};
use std::path::PathBuf;
use time::OffsetDateTime;

use crate::args::{HistoryArgs, OpportunitiesArgs, OutreachArgs};
use crate::commands::analyze::open_store;
use crate::config::AppConfig;

pub async fn opportunities(args: OpportunitiesArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = open_store(&config).await?;

    let records = store
        .top_opportunities(args.min_score, args.limit)
        .await
        .context("Failed to query opportunities")?;

    if args.json {
        let json = serde_json::to_string_pretty(&records).context("Failed to serialize output")?;
        println!("{}", json);
        return Ok(());
    }

    if records.is_empty() {
        println!(
            "No opportunities with score >= {:.1}. Analyze some profiles first.",
            args.min_score
        );
        return Ok(());
    }

    let renderer = Renderer::new(RenderConfig::default());
    println!("Top opportunities (score >= {:.1}):", args.min_score);
    println!();
    for (i, record) in records.iter().enumerate() {
        println!("{}", renderer.render_opportunity(record, i + 1));
    }

    Ok(())
}

pub async fn history(args: HistoryArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let username = normalize_username(&args.username)?;
    let store = open_store(&config).await?;

    let records = store
        .history(&username, args.limit)
        .await
        .context("Failed to query history")?;

    if args.json {
        let json = serde_json::to_string_pretty(&records).context("Failed to serialize output")?;
        println!("{}", json);
        return Ok(());
    }

    if records.is_empty() {
        bail!("No analyses stored for @{}", username);
    }

    let renderer = Renderer::new(RenderConfig::default());
    println!("History for @{} (newest first):", username);
    println!();
    for record in &records {
        println!("{}", renderer.render_history_line(&record.result));
    }

    if let Some(latest) = records.first() {
        let outreach = &latest.outreach;
        if outreach.contacted || outreach.converted {
            println!();
            println!(
                "Outreach: contacted={} converted={}{}",
                outreach.contacted,
                outreach.converted,
                outreach
                    .notes
                    .as_deref()
                    .map(|notes| format!(" notes=\"{}\"", notes))
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}

pub async fn contact(args: OutreachArgs, config_path: Option<PathBuf>) -> Result<()> {
    update_outreach(args, config_path, Outreach::Contacted).await
}

pub async fn convert(args: OutreachArgs, config_path: Option<PathBuf>) -> Result<()> {
    update_outreach(args, config_path, Outreach::Converted).await
}

#[derive(Debug, Clone, Copy)]
enum Outreach {
    Contacted,
    Converted,
}

async fn update_outreach(
    args: OutreachArgs,
    config_path: Option<PathBuf>,
    step: Outreach,
) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let username = normalize_username(&args.username)?;
    let store = open_store(&config).await?;
    let now = OffsetDateTime::now_utc();
    let notes = args.notes.as_deref();

    let updated = match step {
        Outreach::Contacted => store.mark_contacted(&username, notes, now).await,
        Outreach::Converted => store.mark_converted(&username, notes, now).await,
    }
    .context("Failed to update outreach status")?;

    if !updated {
        bail!(
            "No analysis stored for @{}. Run 'profile-scout analyze {}' first.",
            username,
            username
        );
    }

    tracing::info!(username = %username, step = ?step, "Outreach updated");
    match step {
        Outreach::Contacted => println!("Marked @{} as contacted", username),
        Outreach::Converted => println!("Marked @{} as converted", username),
    }

    Ok(())
}
