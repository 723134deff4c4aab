//! Subcommand implementations

pub mod analyze;
pub mod batch;
pub mod config;
pub mod doctor;
pub mod leads;
pub mod report;
pub mod serve;
pub mod watch;
