//! Configuration loading and management

use anyhow::{Context, Result};
use profile_scout_domain::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default)]
    pub rate_limit_per_minute: u32,

    #[serde(default)]
    pub rate_limit_per_hour: u32,

    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Stored analyses younger than this are reused; 0 always fetches
    #[serde(default = "default_analysis_max_age")]
    pub analysis_max_age_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceProvider {
    Fs,
    Http,
    Stub,
}

impl SourceProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fs => "fs",
            Self::Http => "http",
            Self::Stub => "stub",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_provider")]
    pub provider: SourceProvider,

    #[serde(default = "default_snapshots_dir")]
    pub snapshots_dir: PathBuf,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub usernames: Vec<String>,

    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Optional JSONL audit trail of every analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Period of the opportunities report; 0 disables it
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Env var holding the bearer token; unset or empty leaves the API open
    #[serde(default = "default_server_key_env")]
    pub api_key_env: String,
}

// Default value functions
fn default_state_db_path() -> PathBuf {
    PathBuf::from("./profile-scout.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("./reports")
}

fn default_provider() -> SourceProvider {
    SourceProvider::Fs
}

fn default_snapshots_dir() -> PathBuf {
    PathBuf::from("./snapshots")
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_api_key_env() -> String {
    "PROFILE_SCOUT_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    86_400
}

fn default_min_score() -> f64 {
    5.0
}

fn default_analysis_max_age() -> u64 {
    86_400
}

fn default_report_interval() -> u64 {
    604_800
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_server_key_env() -> String {
    "PROFILE_SCOUT_SERVER_KEY".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_db_path: default_state_db_path(),
            log_level: default_log_level(),
            max_concurrent: default_max_concurrent(),
            rate_limit_per_minute: 0,
            rate_limit_per_hour: 0,
            export_dir: default_export_dir(),
            analysis_max_age_secs: default_analysis_max_age(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            snapshots_dir: default_snapshots_dir(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            usernames: vec![],
            min_score: default_min_score(),
            log_path: None,
            report_interval_secs: default_report_interval(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            api_key_env: default_server_key_env(),
        }
    }
}

impl GeneralConfig {
    /// 0 disables a limit
    pub fn rate_limits(&self) -> (Option<u32>, Option<u32>) {
        let limit = |value: u32| if value == 0 { None } else { Some(value) };
        (
            limit(self.rate_limit_per_minute),
            limit(self.rate_limit_per_hour),
        )
    }

    pub fn analysis_max_age(&self) -> Option<time::Duration> {
        match self.analysis_max_age_secs {
            0 => None,
            secs => Some(time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))),
        }
    }
}

impl WatchConfig {
    pub fn report_interval(&self) -> Option<std::time::Duration> {
        match self.report_interval_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PROFILE_SCOUT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# profile-scout configuration

[general]
state_db_path = "./profile-scout.sqlite"
log_level = "info"
max_concurrent = 4
# Profile fetches per minute / hour; 0 disables the limit
rate_limit_per_minute = 0
rate_limit_per_hour = 0
export_dir = "./reports"
# Reuse stored analyses younger than this; 0 always fetches
analysis_max_age_secs = 86400

[source]
provider = "fs"  # fs, http, stub
# fs: one <username>.json snapshot per profile
snapshots_dir = "./snapshots"
# http: GET {base_url}/profiles/{username}
base_url = "http://localhost:8080"
api_key_env = "PROFILE_SCOUT_API_KEY"
timeout_secs = 30

[watch]
poll_interval_secs = 86400
usernames = ["example_bakery", "example_studio"]
min_score = 5.0
# log_path = "./watch.jsonl"
# Weekly opportunities report; 0 disables it
report_interval_secs = 604800

[server]
bind = "127.0.0.1:8000"
# Bearer token for the API; leave the variable unset to run without auth
api_key_env = "PROFILE_SCOUT_SERVER_KEY"

# Engine thresholds. Every key is optional; omitted keys keep their defaults.
[analysis]
trend_epsilon = 0.25

[analysis.cadence]
daily_max_gap_days = 1.5
frequent_max_gap_days = 4.0
weekly_max_gap_days = 9.0
irregular_max_gap_days = 30.0

[analysis.issues]
engagement_floor_pct = 3.0
engagement_min_followers = 100
dormancy_days = 7
follower_ratio_ceiling = 1.0
comment_to_like_floor = 0.02
min_total_posts = 50
min_bio_chars = 1

[analysis.scoring]
base_points = 5.0
business_bonus = 0.5
strong_baseline = 9.0
weak_baseline = 7.0
high_penalty = 3.0
# Total penalty at or below which an account counts as healthy
negligible_penalty = 0.25
dormant_after_days = 180
# follower_tiers = [{ min = 100, points = 1.0 }, { min = 1000, points = 2.5 }]

[analysis.scoring.penalties]
low_engagement = 1.0
irregular_posting = 0.5
inactive_account = 0.75
follow_ratio_imbalance = 0.25
low_community_engagement = 0.5
limited_content = 0.5
incomplete_bio = 0.25
"#
        .to_string()
    }
}
