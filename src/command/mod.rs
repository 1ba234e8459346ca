//! Command side of the pipeline
//!
//! Trusted namespaces come from a [`CommandRegistry`], generated candidates
//! are scored by the [`ConfidenceScorer`], and approved commands are handed
//! to a [`ProcessExecutor`] outside the pipeline.

pub mod executor;
pub mod registry;
pub mod scorer;

pub use executor::{run_in_order, DryRunExecutor, ExecutionOutput, HandoffReport, ProcessExecutor, ShellExecutor};
pub use registry::{CommandRegistry, StaticRegistry};
pub use scorer::{ConfidenceScorer, ScoreBreakdown, ScoreWeights};
