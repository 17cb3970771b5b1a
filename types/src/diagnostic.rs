//! The internal, position-corrected diagnostic record.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::Severity;

/// A 0-indexed row/column pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub row: u32,
    pub column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// Half-open span between two positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// A single classified diagnostic.
///
/// Fields are private; external consumers read via accessors. Positions are
/// 0-indexed and never point at lines injected by preprocessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<String>,
    /// Display message, `"{code} — {message}"` when a code is present.
    message: String,
    file: PathBuf,
    range: Range,
}

impl Diagnostic {
    #[must_use]
    pub fn new(
        severity: Severity,
        code: Option<String>,
        message: String,
        file: PathBuf,
        range: Range,
    ) -> Self {
        Self {
            severity,
            code,
            message,
            file,
            range,
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    #[must_use]
    pub fn range(&self) -> Range {
        self.range
    }

    /// Format as `path:row:col: severity: message` (1-indexed for display).
    #[must_use]
    pub fn display_line(&self) -> String {
        format!(
            "{}:{}:{}: {}: {}",
            self.file.display(),
            self.range.start.row + 1,
            self.range.start.column + 1,
            self.severity.label(),
            self.message,
        )
    }
}
