//! Diagnostic pipeline around the ruff analyzer.
//!
//! Two producers share one reporting surface:
//!
//! - [`BufferLinter`] lints a single open document from its in-memory text
//!   (preprocess → invoke over stdin → translate) and returns the result.
//! - [`ProjectScanner`] checks every workspace root from disk, skips files
//!   that are open in a buffer, and owns the set of files it has reported.
//!
//! Opening a document hands authority from the scanner to the buffer linter
//! via [`ProjectScanner::clear_file_messages`].

pub mod buffer;
pub mod document;
pub mod error;
pub mod format;
pub mod preprocess;
pub mod process;
pub mod protocol;
pub mod report;
pub mod scanner;
pub mod translate;

pub(crate) mod paths;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::{BufferLinter, LintMode, LintOutcome};
pub use document::{BufferDocument, Document};
pub use error::LintError;
pub use format::Formatter;
pub use preprocess::{Preprocessed, preprocess};
pub use process::{Input, Invocation, ProcessOutput, ProcessRunner, RunFut, Runner};
pub use protocol::{RawDiagnostic, RawLocation, parse_raw_diagnostics};
pub use report::{DiagnosticsSnapshot, MemoryReporter, ReportOptions, Reporter};
pub use scanner::{ProjectScanner, ScanOutcome};
pub use translate::Translator;
