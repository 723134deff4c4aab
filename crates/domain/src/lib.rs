//! profile-scout domain crate
//!
//! This crate contains the analysis and scoring engine following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `thresholds`: The named configuration table every engine component reads from
//! - `engine`: Pure metric, issue, scoring, recommendation and trend components
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: Application use cases / orchestration

pub mod engine;
pub mod model;
pub mod ports;
pub mod thresholds;
pub mod usecases;

pub use engine::Analyzer;
pub use model::*;
pub use ports::*;
pub use thresholds::{AnalysisConfig, ConfigError};

/// Round to a fixed number of decimal places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
