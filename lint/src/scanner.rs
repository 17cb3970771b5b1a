//! Project-scope producer: checks every workspace root from disk.
//!
//! The scanner owns the set of files it currently has diagnostics for.
//! Files open in a buffer belong to [`BufferLinter`](crate::BufferLinter):
//! the scan skips them, and opening one hands it over through
//! [`ProjectScanner::clear_file_messages`].
//!
//! A root whose analyzer run fails keeps the diagnostics it last published;
//! a root whose output cannot be decoded contributes nothing.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ruffline_config::LinterConfig;
use ruffline_types::Diagnostic;

use crate::error::LintError;
use crate::paths::normalize_path;
use crate::process::{Invocation, ProcessRunner, Runner};
use crate::protocol::{CheckTarget, check_args, parse_raw_diagnostics};
use crate::report::{ReportOptions, Reporter};
use crate::translate::Translator;

/// Result of one [`ProjectScanner::scan`] request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Another scan was in flight; this request was dropped.
    Busy,
    NoRoots,
    Completed { files: usize, diagnostics: usize },
    /// The scan was aborted. Reporter contents and tracked files are unchanged.
    Failed,
}

/// Holds the scanning flag for the lifetime of one scan.
struct ScanGuard<'a>(&'a AtomicBool);

impl<'a> ScanGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct ScanState {
    /// Files currently holding scanner diagnostics.
    tracked: HashSet<PathBuf>,
    /// Diagnostics published by the last completed scan, per root.
    by_root: HashMap<PathBuf, Vec<Diagnostic>>,
}

impl ScanState {
    /// What `root` published last time, minus files handed over since or
    /// now open in a buffer.
    fn carried_forward(&self, root: &Path, open: &HashSet<PathBuf>) -> Vec<Diagnostic> {
        self.by_root
            .get(root)
            .into_iter()
            .flatten()
            .filter(|d| self.tracked.contains(d.file()) && !open.contains(d.file()))
            .cloned()
            .collect()
    }
}

pub struct ProjectScanner<P: Reporter, R: Runner = ProcessRunner> {
    config: LinterConfig,
    translator: Translator,
    runner: R,
    reporter: P,
    scanning: AtomicBool,
    state: Mutex<ScanState>,
}

impl<P: Reporter> ProjectScanner<P> {
    pub fn new(config: LinterConfig, reporter: P) -> Self {
        Self::with_runner(config, reporter, ProcessRunner)
    }
}

impl<P: Reporter, R: Runner> ProjectScanner<P, R> {
    pub fn with_runner(config: LinterConfig, reporter: P, runner: R) -> Self {
        Self {
            translator: Translator::from_config(&config),
            config,
            runner,
            reporter,
            scanning: AtomicBool::new(false),
            state: Mutex::new(ScanState::default()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &LinterConfig {
        &self.config
    }

    #[must_use]
    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Files currently holding scanner diagnostics, sorted.
    #[must_use]
    pub fn tracked_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.lock_state().tracked.iter().cloned().collect();
        files.sort();
        files
    }

    /// Check every root and replace the scanner's whole diagnostic set.
    ///
    /// Diagnostics for `open_paths` are skipped. A request made while another
    /// scan is running returns [`ScanOutcome::Busy`] immediately.
    pub async fn scan(&self, roots: &[PathBuf], open_paths: &[PathBuf]) -> ScanOutcome {
        let Some(_guard) = ScanGuard::acquire(&self.scanning) else {
            tracing::debug!("Scan already in progress; request dropped");
            return ScanOutcome::Busy;
        };
        if roots.is_empty() {
            return ScanOutcome::NoRoots;
        }

        let open: HashSet<PathBuf> = open_paths.iter().map(|p| normalize_path(p)).collect();
        let mut by_root: HashMap<PathBuf, Vec<Diagnostic>> = HashMap::new();
        for root in roots {
            let found = match self.scan_root(root, &open).await {
                Ok(found) => found,
                Err(e) if e.aborts_scan() => {
                    tracing::warn!("Project scan aborted: {e}");
                    return ScanOutcome::Failed;
                }
                Err(e @ LintError::Parse(_)) => {
                    tracing::warn!("Discarding output for {}: {e}", root.display());
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!("Keeping previous results for {}: {e}", root.display());
                    self.lock_state().carried_forward(root, &open)
                }
            };
            by_root.insert(root.clone(), found);
        }

        let diagnostics: Vec<Diagnostic> = roots
            .iter()
            .filter_map(|root| by_root.get(root))
            .flatten()
            .cloned()
            .collect();
        let files: HashSet<PathBuf> = diagnostics
            .iter()
            .map(|d| d.file().to_path_buf())
            .collect();
        let outcome = ScanOutcome::Completed {
            files: files.len(),
            diagnostics: diagnostics.len(),
        };
        tracing::info!(
            roots = roots.len(),
            files = files.len(),
            diagnostics = diagnostics.len(),
            "Project scan complete"
        );

        self.reporter.set_all_messages(
            diagnostics,
            ReportOptions {
                show_project_view: true,
            },
        );
        let mut state = self.lock_state();
        state.tracked = files;
        state.by_root = by_root;
        outcome
    }

    async fn scan_root(
        &self,
        root: &Path,
        open: &HashSet<PathBuf>,
    ) -> Result<Vec<Diagnostic>, LintError> {
        let args = check_args(&self.config, CheckTarget::Root(root), false);
        let invocation = Invocation::new(self.config.executable.clone(), args, self.config.process)
            .cwd(Some(root.to_path_buf()));
        let output = self.runner.run(invocation).await?;

        let mut found = Vec::new();
        for raw in parse_raw_diagnostics(&output.stdout)? {
            let Some(filename) = raw.filename.as_deref() else {
                continue;
            };
            let file = normalize_path(&root.join(filename));
            if open.contains(&file) {
                continue;
            }
            found.extend(self.translator.translate(&file, &raw, 0));
        }
        tracing::debug!(root = %root.display(), count = found.len(), "Root checked");
        Ok(found)
    }

    /// Hand `path` over to the buffer linter. Returns whether it was tracked.
    pub fn clear_file_messages(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        if !self.lock_state().tracked.remove(&path) {
            return false;
        }
        self.reporter.set_messages(&path, Vec::new());
        true
    }

    /// Drop everything the scanner reported (workspace roots changed).
    pub fn clear_all_messages(&self) {
        {
            let mut state = self.lock_state();
            state.tracked.clear();
            state.by_root.clear();
        }
        self.reporter.clear_messages();
    }

    /// Teardown.
    pub fn dispose(&self) {
        self.clear_all_messages();
    }

    fn lock_state(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
