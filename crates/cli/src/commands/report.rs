//! Report command - recent opportunities that nobody has contacted yet

use anyhow::{Context, Result, bail};
use profile_scout_domain::usecases::{
    Digest, DigestConfig, OpportunityDigest, RenderConfig, Renderer,
};
use profile_scout_domain::{AnalysisStore, Clock, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use time::Duration;

use crate::args::ReportArgs;
use crate::commands::analyze::open_store;
use crate::config::AppConfig;

pub async fn execute(args: ReportArgs, config_path: Option<PathBuf>) -> Result<()> {
    if args.days <= 0 {
        bail!("--days must be positive (got {})", args.days);
    }
    if !(0.0..=10.0).contains(&args.min_score) {
        bail!("--min-score must be between 0 and 10 (got {})", args.min_score);
    }

    let config = AppConfig::load(config_path.as_deref())?;
    let store = open_store(&config).await?;

    let digest = build_digest(
        store,
        DigestConfig {
            window: Duration::days(args.days),
            min_score: args.min_score,
            limit: args.limit,
        },
    )
    .await?;

    if args.json {
        let json = serde_json::to_string_pretty(&digest).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print!("{}", render(&digest));
    }

    Ok(())
}

pub async fn build_digest(store: Arc<dyn AnalysisStore>, config: DigestConfig) -> Result<Digest> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    OpportunityDigest::new(store, clock, config)
        .build()
        .await
        .context("Failed to build opportunities report")
}

pub fn render(digest: &Digest) -> String {
    Renderer::new(RenderConfig::default()).render_digest(digest)
}
