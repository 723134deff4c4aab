//! Doctor command - validate configuration and show status

use anyhow::Result;
use profile_scout_adapters::state::SqliteAnalysisStore;
use profile_scout_domain::AnalysisStore;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::{AppConfig, SourceProvider};

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    thresholds: CheckResult,
    source: CheckResult,
    store: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        thresholds: CheckResult::error("Not checked"),
        source: CheckResult::error("Not checked"),
        store: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.thresholds = check_thresholds(config);
        report.source = check_source(config);
        report.store = check_store(config).await;
    }

    let checks = [
        &report.config,
        &report.thresholds,
        &report.source,
        &report.store,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_thresholds(config: &AppConfig) -> CheckResult {
    match config.analysis.validate() {
        Ok(()) => CheckResult::ok(format!(
            "Thresholds valid (engagement floor {:.1}%, dormancy {} days, trend epsilon {})",
            config.analysis.issues.engagement_floor_pct,
            config.analysis.issues.dormancy_days,
            config.analysis.trend_epsilon
        )),
        Err(e) => CheckResult::error(format!("Invalid [analysis] configuration: {}", e)),
    }
}

fn check_source(config: &AppConfig) -> CheckResult {
    let source = &config.source;
    match source.provider {
        SourceProvider::Fs => {
            let dir = &source.snapshots_dir;
            if !dir.is_dir() {
                return CheckResult::error(format!(
                    "Snapshots directory does not exist: {}",
                    dir.display()
                ));
            }
            let count = std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .filter_map(|entry| entry.ok())
                        .filter(|entry| {
                            entry.path().extension().and_then(|ext| ext.to_str()) == Some("json")
                        })
                        .count()
                })
                .unwrap_or(0);
            CheckResult::ok(format!(
                "Provider: fs, {} snapshot(s) in {}",
                count,
                dir.display()
            ))
            .with_details(serde_json::json!({ "snapshots": count }))
        }
        SourceProvider::Http => {
            if source.base_url.trim().is_empty() {
                return CheckResult::error("HTTP source base_url is empty");
            }
            match std::env::var(&source.api_key_env) {
                Ok(val) if !val.is_empty() => CheckResult::ok(format!(
                    "Provider: http, base_url: {}, API key: {} (set)",
                    source.base_url, source.api_key_env
                )),
                _ => CheckResult::warn(format!(
                    "Provider: http, base_url: {}, API key: {} (not set)",
                    source.base_url, source.api_key_env
                )),
            }
        }
        SourceProvider::Stub => CheckResult::ok("Provider: stub (offline demo profiles)"),
    }
}

async fn check_store(config: &AppConfig) -> CheckResult {
    let path = &config.general.state_db_path;
    let store = match SqliteAnalysisStore::new(path).await {
        Ok(store) => store,
        Err(e) => {
            return CheckResult::error(format!("Failed to open {}: {}", path.display(), e));
        }
    };

    match store.stats().await {
        Ok(stats) => CheckResult::ok(format!(
            "{}: {} profile(s), {} analyses, {} contacted, {} converted",
            path.display(),
            stats.profiles,
            stats.analyses,
            stats.contacted,
            stats.converted
        ))
        .with_details(serde_json::to_value(stats).unwrap_or_default()),
        Err(e) => CheckResult::error(format!("Failed to query {}: {}", path.display(), e)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("profile-scout Doctor Report");
    println!("===========================");
    println!();

    print_check("Config", &report.config);
    print_check("Thresholds", &report.thresholds);
    print_check("Source", &report.source);
    print_check("Store", &report.store);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: profile-scout analyze <username>");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
