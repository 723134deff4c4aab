//! profile-scout adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `state`: SQLite and in-memory analysis stores
//! - `source`: filesystem, HTTP and stub profile sources
//! - `export`: JSON report files and the JSONL report log

mod state_memory;
mod state_sqlite;

pub mod export;
pub mod source;

/// Re-exports for state adapters
pub mod state {
    pub use crate::state_memory::InMemoryAnalysisStore;
    pub use crate::state_sqlite::SqliteAnalysisStore;
}
