//! Raw analyzer diagnostics → classified, position-corrected [`Diagnostic`]s.

use std::path::Path;

use ruffline_config::LinterConfig;
use ruffline_types::{Diagnostic, Position, Range, Severity, SeverityRules};

use crate::protocol::{RawDiagnostic, UNPARSEABLE_CODE};

/// Appended to codes no severity list matched, when marking is enabled.
pub const UNCATEGORIZED_MARKER: char = '*';

/// Classifies and re-positions raw diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translator {
    rules: SeverityRules,
    mark_uncategorized: bool,
}

impl Translator {
    #[must_use]
    pub fn new(rules: SeverityRules, mark_uncategorized: bool) -> Self {
        Self {
            rules,
            mark_uncategorized,
        }
    }

    #[must_use]
    pub fn from_config(config: &LinterConfig) -> Self {
        Self::new(config.severity.clone(), config.mark_uncategorized)
    }

    /// Translate one raw diagnostic reported against `file`.
    ///
    /// Returns `None` when the diagnostic points into the `hidden_lines`
    /// injected ahead of the user's text.
    #[must_use]
    pub fn translate(
        &self,
        file: &Path,
        raw: &RawDiagnostic,
        hidden_lines: u32,
    ) -> Option<Diagnostic> {
        if raw.location.row <= hidden_lines {
            return None;
        }

        let (severity, code, start_column) = match raw.code.as_deref() {
            // Syntax-fatal: no rule identity, and the column is unreliable.
            None | Some(UNPARSEABLE_CODE) => (Severity::Error, None, 1),
            Some(code) => match self.rules.classify(code) {
                Some(severity) => (severity, Some(code.to_string()), raw.location.column),
                None => {
                    let code = if self.mark_uncategorized {
                        format!("{code}{UNCATEGORIZED_MARKER}")
                    } else {
                        code.to_string()
                    };
                    (Severity::Error, Some(code), raw.location.column)
                }
            },
        };

        let message = match &code {
            Some(code) => format!("{code} — {}", raw.message),
            None => raw.message.clone(),
        };

        let row_offset = 1 + hidden_lines;
        let range = Range::new(
            Position::new(
                raw.location.row.saturating_sub(row_offset),
                start_column.saturating_sub(1),
            ),
            Position::new(
                raw.end_location.row.saturating_sub(row_offset),
                raw.end_location.column.saturating_sub(1),
            ),
        );

        Some(Diagnostic::new(
            severity,
            code,
            message,
            file.to_path_buf(),
            range,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RawLocation;

    fn raw(code: Option<&str>, start: (u32, u32), end: (u32, u32)) -> RawDiagnostic {
        RawDiagnostic {
            filename: Some("/ws/a.py".to_string()),
            code: code.map(str::to_string),
            message: "something is off".to_string(),
            location: RawLocation {
                row: start.0,
                column: start.1,
            },
            end_location: RawLocation {
                row: end.0,
                column: end.1,
            },
        }
    }

    fn translator(error: &[&str], warning: &[&str], mark: bool) -> Translator {
        let list = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
        Translator::new(SeverityRules::new(list(error), list(warning), Vec::new()), mark)
    }

    #[test]
    fn test_error_prefix() {
        let t = translator(&["E"], &[], true);
        let diag = t
            .translate(Path::new("/ws/a.py"), &raw(Some("E501"), (1, 1), (1, 2)), 0)
            .unwrap();
        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.code(), Some("E501"));
        assert_eq!(diag.message(), "E501 — something is off");
    }

    #[test]
    fn test_null_code_forces_error_and_column() {
        let t = translator(&[], &["E"], true);
        let diag = t
            .translate(Path::new("/ws/a.py"), &raw(None, (4, 9), (4, 12)), 0)
            .unwrap();
        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.code(), None);
        assert_eq!(diag.message(), "something is off");
        assert_eq!(diag.range().start, Position::new(3, 0));
        assert_eq!(diag.range().end, Position::new(3, 11));
    }

    #[test]
    fn test_unparseable_code_is_normalized() {
        let t = translator(&[], &["E"], true);
        let diag = t
            .translate(Path::new("/ws/a.py"), &raw(Some("E999"), (2, 7), (2, 8)), 0)
            .unwrap();
        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.code(), None);
        assert_eq!(diag.message(), "something is off");
        assert_eq!(diag.range().start.column, 0);
    }

    #[test]
    fn test_uncategorized_marker() {
        let marked = translator(&["E"], &["W"], true);
        let diag = marked
            .translate(Path::new("/ws/a.py"), &raw(Some("PLR0913"), (1, 1), (1, 1)), 0)
            .unwrap();
        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.code(), Some("PLR0913*"));
        assert_eq!(diag.message(), "PLR0913* — something is off");

        let plain = translator(&["E"], &["W"], false);
        let diag = plain
            .translate(Path::new("/ws/a.py"), &raw(Some("PLR0913"), (1, 1), (1, 1)), 0)
            .unwrap();
        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.code(), Some("PLR0913"));
    }

    #[test]
    fn test_warning_classification() {
        let t = translator(&["F"], &["W"], true);
        let diag = t
            .translate(Path::new("/ws/a.py"), &raw(Some("W291"), (1, 1), (1, 1)), 0)
            .unwrap();
        assert_eq!(diag.severity(), Severity::Warning);
    }

    #[test]
    fn test_positions_become_zero_based() {
        let t = translator(&["E"], &[], true);
        let diag = t
            .translate(Path::new("/ws/a.py"), &raw(Some("E501"), (5, 3), (9, 7)), 0)
            .unwrap();
        assert_eq!(
            diag.range(),
            Range::new(Position::new(4, 2), Position::new(8, 6))
        );
    }

    #[test]
    fn test_hidden_lines_are_dropped_and_offset() {
        let t = translator(&["E"], &[], true);
        let path = Path::new("/ws/a.py");
        let hidden = raw(Some("E501"), (1, 1), (1, 5));
        assert_eq!(t.translate(path, &hidden, 1), None);

        let visible = t.translate(path, &raw(Some("E501"), (2, 1), (3, 4)), 1).unwrap();
        assert_eq!(visible.range().start, Position::new(0, 0));
        assert_eq!(visible.range().end, Position::new(1, 3));
    }

    #[test]
    fn test_file_comes_from_caller() {
        let t = translator(&["E"], &[], true);
        let diag = t
            .translate(Path::new("/ws/other.py"), &raw(Some("E1"), (1, 1), (1, 1)), 0)
            .unwrap();
        assert_eq!(diag.file(), Path::new("/ws/other.py"));
    }

    #[test]
    fn test_zero_positions_saturate() {
        let t = translator(&["E"], &[], true);
        let diag = t
            .translate(Path::new("/ws/a.py"), &raw(Some("E1"), (1, 0), (0, 0)), 0)
            .unwrap();
        assert_eq!(diag.range(), Range::default());
    }
}
