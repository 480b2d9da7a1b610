//! Batch email triage
//!
//! Records are rendered into a single prompt, sent to the model once, and the
//! reply is parsed and validated into a [`TriageBatch`] before any field is
//! trusted.

mod orchestrator;
pub mod parser;
mod prompt;
mod records;
mod schema;

pub use orchestrator::TriageOrchestrator;
pub use records::{load_records, sample_records};
pub use schema::{AnalysisItem, EmailRecord, TriageBatch};

#[cfg(test)]
pub use schema::{Classification, Priority};
