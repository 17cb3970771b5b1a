//! Terminal and JSON output.

use std::fmt::Write as _;
use std::path::Path;

use ruffline_lint::DiagnosticsSnapshot;
use ruffline_types::Diagnostic;
use serde_json::json;
use similar::TextDiff;

/// One `path:row:col: severity: message` line per diagnostic.
pub(crate) fn diagnostic_lines<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> String {
    let mut out = String::new();
    for diag in diagnostics {
        let _ = writeln!(out, "{}", diag.display_line());
    }
    out
}

/// Snapshot contents in snapshot order (files with errors first).
pub(crate) fn snapshot_lines(snapshot: &DiagnosticsSnapshot) -> String {
    diagnostic_lines(snapshot.files().iter().flat_map(|(_, items)| items))
}

pub(crate) fn diagnostics_json(diagnostics: &[Diagnostic]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(diagnostics)
}

/// Both reporting channels of a scan as `{"project": [...], "open": [...]}`.
pub(crate) fn scan_json(
    project: &DiagnosticsSnapshot,
    open: &DiagnosticsSnapshot,
) -> serde_json::Result<String> {
    let flatten = |snapshot: &DiagnosticsSnapshot| -> serde_json::Result<serde_json::Value> {
        let items: Vec<&Diagnostic> = snapshot
            .files()
            .iter()
            .flat_map(|(_, items)| items)
            .collect();
        serde_json::to_value(items)
    };
    serde_json::to_string_pretty(&json!({
        "project": flatten(project)?,
        "open": flatten(open)?,
    }))
}

/// `project E:1 W:0 I:2 | open E:0 W:1 I:0`, omitting empty channels.
pub(crate) fn status_line(project: &DiagnosticsSnapshot, open: &DiagnosticsSnapshot) -> String {
    [("project", project), ("open", open)]
        .into_iter()
        .filter(|(_, snapshot)| !snapshot.is_empty())
        .map(|(label, snapshot)| format!("{label} {}", snapshot.status_string()))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Unified diff between the on-disk text and the rewritten text.
pub(crate) fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let display = path.display().to_string();
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{display}"), &format!("b/{display}"))
        .to_string()
}
