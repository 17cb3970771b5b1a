//! Reporting surface: where both producers publish their diagnostics.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use ruffline_types::{Diagnostic, Severity};

/// Options for a whole-set replacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Ask the host to surface the project-wide view.
    pub show_project_view: bool,
}

/// A diagnostic sink owned by a single producer.
///
/// Each producer holds its own reporter identity; one producer's calls never
/// replace the other's entries.
pub trait Reporter: Send + Sync {
    /// Replace the diagnostics for one file. An empty list removes the file.
    fn set_messages(&self, path: &Path, diagnostics: Vec<Diagnostic>);
    /// Replace everything this reporter holds.
    fn set_all_messages(&self, diagnostics: Vec<Diagnostic>, options: ReportOptions);
    fn clear_messages(&self);
}

impl<T: Reporter + ?Sized> Reporter for Arc<T> {
    fn set_messages(&self, path: &Path, diagnostics: Vec<Diagnostic>) {
        (**self).set_messages(path, diagnostics);
    }

    fn set_all_messages(&self, diagnostics: Vec<Diagnostic>, options: ReportOptions) {
        (**self).set_all_messages(diagnostics, options);
    }

    fn clear_messages(&self) {
        (**self).clear_messages();
    }
}

/// In-memory per-file store.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    data: Mutex<HashMap<PathBuf, Vec<Diagnostic>>>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted copy of the current contents: files with errors first, then
    /// alphabetically.
    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        let mut files: Vec<(PathBuf, Vec<Diagnostic>)> = data
            .iter()
            .map(|(path, items)| (path.clone(), items.clone()))
            .collect();
        drop(data);

        files.sort_by(|a, b| {
            let a_has_errors = a.1.iter().any(|d| d.severity().is_error());
            let b_has_errors = b.1.iter().any(|d| d.severity().is_error());
            b_has_errors.cmp(&a_has_errors).then_with(|| a.0.cmp(&b.0))
        });

        DiagnosticsSnapshot { files }
    }
}

impl Reporter for MemoryReporter {
    fn set_messages(&self, path: &Path, diagnostics: Vec<Diagnostic>) {
        let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        if diagnostics.is_empty() {
            data.remove(path);
        } else {
            data.insert(path.to_path_buf(), diagnostics);
        }
    }

    fn set_all_messages(&self, diagnostics: Vec<Diagnostic>, _options: ReportOptions) {
        let mut grouped: HashMap<PathBuf, Vec<Diagnostic>> = HashMap::new();
        for diag in diagnostics {
            grouped.entry(diag.file().to_path_buf()).or_default().push(diag);
        }
        *self.data.lock().unwrap_or_else(PoisonError::into_inner) = grouped;
    }

    fn clear_messages(&self) {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Point-in-time view of a [`MemoryReporter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    files: Vec<(PathBuf, Vec<Diagnostic>)>,
}

impl DiagnosticsSnapshot {
    /// Per-file diagnostics, sorted with error-containing files first.
    #[must_use]
    pub fn files(&self) -> &[(PathBuf, Vec<Diagnostic>)] {
        &self.files
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn count_by_severity(&self, severity: Severity) -> usize {
        self.files
            .iter()
            .flat_map(|(_, items)| items)
            .filter(|d| d.severity() == severity)
            .count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count_by_severity(Severity::Error)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count_by_severity(Severity::Warning)
    }

    #[must_use]
    pub fn info_count(&self) -> usize {
        self.count_by_severity(Severity::Info)
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.files.iter().map(|(_, items)| items.len()).sum()
    }

    /// Compact status like `"E:3 W:5 I:0"`; empty when nothing is reported.
    #[must_use]
    pub fn status_string(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!(
            "E:{} W:{} I:{}",
            self.error_count(),
            self.warning_count(),
            self.info_count()
        )
    }
}
