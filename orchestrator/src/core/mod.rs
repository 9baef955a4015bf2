//! Core business logic modules
//!
//! This module contains pure business logic with no I/O dependencies.
//! All functions are deterministic and easily testable.

pub mod budget;
pub mod progress;
pub mod quota;

pub use budget::distribute_budget;
pub use progress::{
    format_error_entry, truncate_label, CancelHandle, ProgressReporter, RunResultEntry, RunState, RunUpdate,
};
pub use quota::{CadenceWindow, PeriodStarts, QuotaCounts, QuotaDecision, QuotaGate};
