//! Analyze command - one profile, fetched or from a snapshot file

use anyhow::{Context, Result, bail};
use profile_scout_adapters::{
    export::ReportExporter,
    source::{FsProfileSource, HttpProfileSource, StubProfileSource},
    state::SqliteAnalysisStore,
};
use profile_scout_domain::usecases::{AnalyzeUseCase, RenderConfig, Renderer};
use profile_scout_domain::{
    AnalysisStore, Analyzer, Clock, ProfileSnapshot, ProfileSource, SystemClock,
    normalize_username,
};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

use crate::args::AnalyzeArgs;
use crate::config::{AppConfig, SourceProvider};

pub type CliUseCase = AnalyzeUseCase<dyn ProfileSource, dyn AnalysisStore, dyn Clock>;

pub async fn execute(args: AnalyzeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let username = normalize_username(&args.username)?;

    let source: Arc<dyn ProfileSource> = if args.snapshot.is_some() {
        Arc::new(StubProfileSource::new())
    } else {
        build_source(&config)?
    };
    let store = open_store(&config).await?;

    let mut usecase = with_freshness(
        build_usecase(&config, source, store)?,
        &config,
        args.force,
    );
    if args.no_save {
        usecase = usecase.without_persistence();
    }

    let report = match &args.snapshot {
        Some(path) => {
            let snapshot = read_snapshot(path)?;
            let snapshot_user = normalize_username(&snapshot.username)?;
            if snapshot_user != username {
                bail!(
                    "Snapshot {} is for @{}, not @{}",
                    path.display(),
                    snapshot_user,
                    username
                );
            }
            usecase.analyze_snapshot(&snapshot).await
        }
        None if args.force => usecase.refresh_username(&username).await,
        None => usecase.analyze_username(&username).await,
    }
    .with_context(|| format!("Failed to analyze @{}", username))?;

    if let Some(target) = &args.export {
        let exporter = ReportExporter::new(&config.general.export_dir);
        let path = match target {
            Some(path) => {
                exporter
                    .export_to(&report, path)
                    .await
                    .context("Failed to export report")?;
                path.clone()
            }
            None => exporter
                .export(&report)
                .await
                .context("Failed to export report")?,
        };
        eprintln!("Report exported to: {}", path.display());
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        let renderer = Renderer::new(RenderConfig {
            max_issues: args.top,
            max_recommendations: args.top,
            ..Default::default()
        });
        print!("{}", renderer.render_report(&report));
    }

    Ok(())
}

fn read_snapshot(path: &Path) -> Result<ProfileSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
}

/// Build the profile source selected by `[source].provider`
pub fn build_source(config: &AppConfig) -> Result<Arc<dyn ProfileSource>> {
    let source: Arc<dyn ProfileSource> = match config.source.provider {
        SourceProvider::Fs => Arc::new(FsProfileSource::new(&config.source.snapshots_dir)),
        SourceProvider::Http => {
            let api_key = load_api_key(&config.source.api_key_env);
            if api_key.is_none() {
                tracing::warn!(
                    env = %config.source.api_key_env,
                    "API key not set, calling the scraper without authentication"
                );
            }
            Arc::new(
                HttpProfileSource::new(
                    config.source.base_url.clone(),
                    api_key,
                    Duration::from_secs(config.source.timeout_secs),
                )
                .context("Failed to build HTTP profile source")?,
            )
        }
        SourceProvider::Stub => Arc::new(StubProfileSource::demo(OffsetDateTime::now_utc())),
    };
    Ok(source)
}

/// Read a secret from the named environment variable, if set and non-empty
pub fn load_api_key(env_var: &str) -> Option<SecretString> {
    if env_var.is_empty() {
        return None;
    }
    std::env::var(env_var)
        .ok()
        .filter(|value| !value.is_empty())
        .map(|value| SecretString::new(value.into()))
}

pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn AnalysisStore>> {
    let store = SqliteAnalysisStore::new(&config.general.state_db_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open analysis store: {}",
                config.general.state_db_path.display()
            )
        })?;
    Ok(Arc::new(store))
}

pub fn build_analyzer(config: &AppConfig) -> Result<Analyzer> {
    config
        .analysis
        .validate()
        .context("Invalid [analysis] configuration")?;
    Ok(Analyzer::new(config.analysis.clone()))
}

pub fn build_usecase(
    config: &AppConfig,
    source: Arc<dyn ProfileSource>,
    store: Arc<dyn AnalysisStore>,
) -> Result<CliUseCase> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    Ok(AnalyzeUseCase::new(
        source,
        store,
        clock,
        build_analyzer(config)?,
    ))
}

/// Reuse stored analyses younger than `[general].analysis_max_age_secs` unless forced
pub fn with_freshness(usecase: CliUseCase, config: &AppConfig, force: bool) -> CliUseCase {
    match config.general.analysis_max_age() {
        Some(max_age) if !force => usecase.with_max_age(max_age),
        _ => usecase,
    }
}
