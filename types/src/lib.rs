//! Core diagnostic types for ruffline.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Both diagnostic producers (buffer linter, project scanner) and every reporting
//! surface speak in terms of these types.

mod diagnostic;
mod severity;

pub use diagnostic::{Diagnostic, Position, Range};
pub use severity::{Severity, SeverityRules};

/// The analyzer's executable name, also the directory of its user-level config.
pub const ANALYZER: &str = "ruff";
