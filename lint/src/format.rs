//! Document and selection formatting through `ruff format`.

use std::ops::{Range, RangeInclusive};
use std::path::Path;

use ruffline_config::LinterConfig;

use crate::document::Document;
use crate::error::LintError;
use crate::paths::parent_dir;
use crate::process::{Invocation, ProcessRunner, Runner};
use crate::protocol::format_args;

#[derive(Debug)]
pub struct Formatter<R: Runner = ProcessRunner> {
    config: LinterConfig,
    runner: R,
}

impl Formatter {
    #[must_use]
    pub fn new(config: LinterConfig) -> Self {
        Self::with_runner(config, ProcessRunner)
    }
}

impl<R: Runner> Formatter<R> {
    pub fn with_runner(config: LinterConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Format `text` as if it were the contents of `path`.
    pub async fn format(&self, path: &Path, text: &str) -> Result<String, LintError> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let invocation = Invocation::new(
            self.config.executable.clone(),
            format_args(path),
            self.config.process,
        )
        .cwd(parent_dir(path))
        .stdin(text.to_string());
        Ok(self.runner.run(invocation).await?.stdout)
    }

    /// Replace the document text with its formatted form. Returns whether the
    /// text changed.
    pub async fn format_document<D: Document + ?Sized>(
        &self,
        doc: &mut D,
    ) -> Result<bool, LintError> {
        let formatted = self.format(doc.path(), doc.text()).await?;
        if formatted == doc.text() {
            return Ok(false);
        }
        doc.set_text(formatted);
        Ok(true)
    }

    /// Format only the given 0-based, inclusive line range and splice the
    /// result back. Lines past the end are ignored; an empty selection is a
    /// no-op. Returns whether the text changed.
    ///
    /// The selection is formatted on its own, so it must parse as a
    /// standalone module.
    pub async fn format_selection<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        lines: RangeInclusive<usize>,
    ) -> Result<bool, LintError> {
        let Some(span) = line_span(doc.text(), &lines) else {
            return Ok(false);
        };
        let text = doc.text();
        let selected = &text[span.clone()];
        let formatted = self.format(doc.path(), selected).await?;
        if formatted == selected {
            return Ok(false);
        }

        let mut out = String::with_capacity(text.len() - selected.len() + formatted.len());
        out.push_str(&text[..span.start]);
        out.push_str(&formatted);
        out.push_str(&text[span.end..]);
        doc.set_text(out);
        Ok(true)
    }
}

/// Byte span covering `lines`, line terminators included.
fn line_span(text: &str, lines: &RangeInclusive<usize>) -> Option<Range<usize>> {
    let mut offset = 0;
    let mut start = None;
    let mut end = None;
    for (index, line) in text.split_inclusive('\n').enumerate() {
        if index > *lines.end() {
            break;
        }
        if index == *lines.start() {
            start = Some(offset);
        }
        offset += line.len();
        end = Some(offset);
    }
    let (start, end) = (start?, end?);
    (start < end).then_some(start..end)
}
