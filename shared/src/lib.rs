//! Shared types for the content generation orchestrator
//!
//! Contains the domain vocabulary (sites, cadence, keywords, articles) used by
//! the orchestrator and its service implementations, plus common error and
//! logging utilities.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
