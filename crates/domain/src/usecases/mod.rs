//! Application use cases / orchestration

pub mod analyze;
pub mod batch;
pub mod digest;
pub mod render;

#[cfg(test)]
pub(crate) mod testing;

pub use analyze::{AnalyzeError, AnalyzeUseCase};
pub use batch::{BatchAnalyzer, BatchConfig, BatchEntry, BatchError, BatchOutcome, BatchSummary};
pub use digest::{Digest, DigestConfig, OpportunityDigest};
pub use render::{RenderConfig, Renderer};
