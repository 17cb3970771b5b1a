//! Test doubles for the runner and reporter seams.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ruffline_types::{Diagnostic, Position, Range, Severity};
use serde_json::json;
use tokio::sync::Notify;

use crate::error::LintError;
use crate::process::{Invocation, ProcessOutput, RunFut, Runner};
use crate::report::{ReportOptions, Reporter};

pub(crate) fn diag(severity: Severity, file: &str, row: u32) -> Diagnostic {
    Diagnostic::new(
        severity,
        None,
        format!("finding on row {row}"),
        PathBuf::from(file),
        Range::new(Position::new(row, 0), Position::new(row, 1)),
    )
}

/// Analyzer JSON for `(filename, code, row)` triples; columns are fixed.
pub(crate) fn raw_json(entries: &[(Option<&str>, &str, u32)]) -> String {
    let items: Vec<_> = entries
        .iter()
        .map(|(filename, code, row)| {
            json!({
                "filename": filename,
                "code": code,
                "message": format!("{code} message"),
                "location": {"row": row, "column": 1},
                "end_location": {"row": row, "column": 4},
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Stdout(String),
    Stderr(String),
    Spawn,
}

/// Lets a test hold an invocation open: `started` fires when the runner is
/// entered, the runner then waits for `release`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Gate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// Replays canned responses keyed by the invocation's working directory.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
    by_cwd: HashMap<PathBuf, Scripted>,
    fallback: Option<Scripted>,
    gate: Option<Gate>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, cwd: impl Into<PathBuf>, scripted: Scripted) -> Self {
        self.by_cwd.insert(cwd.into(), scripted);
        self
    }

    pub fn fallback(mut self, scripted: Scripted) -> Self {
        self.fallback = Some(scripted);
        self
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl Runner for ScriptedRunner {
    fn run(&self, invocation: Invocation) -> RunFut<'_> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(invocation.clone());
            if let Some(gate) = &self.gate {
                gate.started.notify_one();
                gate.release.notified().await;
            }

            let scripted = invocation
                .cwd
                .as_ref()
                .and_then(|cwd| self.by_cwd.get(cwd))
                .or(self.fallback.as_ref())
                .cloned()
                .unwrap_or(Scripted::Stdout(String::new()));

            match scripted {
                Scripted::Stdout(stdout) => Ok(ProcessOutput::new(stdout)),
                Scripted::Stderr(stderr) => Err(LintError::Stderr {
                    program: invocation.program,
                    stderr,
                }),
                Scripted::Spawn => Err(LintError::Spawn {
                    program: invocation.program,
                    source: io::Error::new(io::ErrorKind::NotFound, "not found"),
                }),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReportCall {
    Set(PathBuf, Vec<Diagnostic>),
    SetAll(Vec<Diagnostic>, ReportOptions),
    Clear,
}

/// Records every call that reaches the reporting surface.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    calls: Mutex<Vec<ReportCall>>,
}

impl RecordingReporter {
    pub fn calls(&self) -> Vec<ReportCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn set_messages(&self, path: &Path, diagnostics: Vec<Diagnostic>) {
        self.calls
            .lock()
            .unwrap()
            .push(ReportCall::Set(path.to_path_buf(), diagnostics));
    }

    fn set_all_messages(&self, diagnostics: Vec<Diagnostic>, options: ReportOptions) {
        self.calls
            .lock()
            .unwrap()
            .push(ReportCall::SetAll(diagnostics, options));
    }

    fn clear_messages(&self) {
        self.calls.lock().unwrap().push(ReportCall::Clear);
    }
}
