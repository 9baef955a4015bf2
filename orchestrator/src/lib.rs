//! Orchestrator library for scheduled and bulk content generation
//!
//! Decides, under per-site quota and cadence constraints, which keyword each
//! site consumes next, runs the generate → improve → image → persist pipeline
//! with claim/release recovery, and reports live progress to an operator who
//! may cancel mid-run.

pub mod allocator;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use allocator::KeywordAllocator;
pub use core::{
    distribute_budget, CadenceWindow, CancelHandle, ProgressReporter, QuotaCounts, QuotaDecision, QuotaGate, RunState,
    RunUpdate,
};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, RunOneOutcome, RunPlan, RunSummary, RunTask, ScheduledOutcome};
pub use pipeline::{GenerationPipeline, PipelineOptions, PipelineOutcome};
pub use traits::{Clock, ContentGenerator, ContentImprover, ImageGenerator, Store};
