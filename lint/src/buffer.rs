//! Buffer-scope producer: lints one open document from its in-memory text.

use ruffline_config::LinterConfig;
use ruffline_types::Diagnostic;

use crate::document::Document;
use crate::error::LintError;
use crate::paths::{is_python_source, parent_dir};
use crate::preprocess::preprocess;
use crate::process::{Invocation, ProcessRunner, Runner};
use crate::protocol::{CheckTarget, check_args, parse_raw_diagnostics};
use crate::translate::Translator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintMode {
    /// Report diagnostics for the buffer.
    Diagnostics,
    /// Apply the analyzer's fixes to the buffer text.
    Fix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintOutcome {
    Diagnostics(Vec<Diagnostic>),
    /// The document text was replaced with the fixed text.
    Fixed,
}

/// Lints single documents. Holds no state between calls.
#[derive(Debug)]
pub struct BufferLinter<R: Runner = ProcessRunner> {
    config: LinterConfig,
    translator: Translator,
    runner: R,
}

impl BufferLinter {
    #[must_use]
    pub fn new(config: LinterConfig) -> Self {
        Self::with_runner(config, ProcessRunner)
    }
}

impl<R: Runner> BufferLinter<R> {
    pub fn with_runner(config: LinterConfig, runner: R) -> Self {
        Self {
            translator: Translator::from_config(&config),
            config,
            runner,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LinterConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LinterConfig) {
        self.translator = Translator::from_config(&config);
        self.config = config;
    }

    /// Lint `doc` once. Every failure is returned to the caller.
    ///
    /// Fix mode streams the unmodified text, so the analyzer's output can be
    /// written back verbatim.
    pub async fn lint<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        mode: LintMode,
    ) -> Result<LintOutcome, LintError> {
        if !self.config.enabled {
            tracing::debug!("Linting disabled; skipping {}", doc.path().display());
            return Ok(LintOutcome::Diagnostics(Vec::new()));
        }
        let path = doc.path().to_path_buf();
        if !is_python_source(&path) {
            tracing::debug!("Not a Python source; skipping {}", path.display());
            return Ok(LintOutcome::Diagnostics(Vec::new()));
        }

        let fix = mode == LintMode::Fix;
        let args = check_args(&self.config, CheckTarget::Stdin(&path), fix);
        let invocation = Invocation::new(self.config.executable.clone(), args, self.config.process)
            .cwd(parent_dir(&path));

        if fix {
            let output = self
                .runner
                .run(invocation.stdin(doc.text().to_string()))
                .await?;
            doc.set_text(output.stdout);
            return Ok(LintOutcome::Fixed);
        }

        let prepared = preprocess(doc.text(), self.config.allow_magic);
        let output = self.runner.run(invocation.stdin(prepared.text)).await?;
        let diagnostics: Vec<Diagnostic> = parse_raw_diagnostics(&output.stdout)?
            .iter()
            .filter_map(|raw| self.translator.translate(&path, raw, prepared.hidden_lines))
            .collect();

        tracing::debug!(
            path = %path.display(),
            count = diagnostics.len(),
            "Buffer lint complete"
        );
        Ok(LintOutcome::Diagnostics(diagnostics))
    }
}
