//! Analyzer wire format: command lines going out, JSON diagnostics coming back.

use std::collections::BTreeMap;
use std::path::Path;

use ruffline_config::LinterConfig;
use serde::Deserialize;

use crate::error::LintError;

/// Code the analyzer uses for input it could not parse at all.
pub const UNPARSEABLE_CODE: &str = "E999";

/// A diagnostic as emitted by `ruff check --output-format=json`.
///
/// Rows and columns are 1-based. Fields the pipeline does not use
/// (`fix`, `url`, `noqa_row`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawDiagnostic {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
    pub location: RawLocation,
    pub end_location: RawLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RawLocation {
    pub row: u32,
    pub column: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPayload {
    List(Vec<RawDiagnostic>),
    Map(BTreeMap<String, RawDiagnostic>),
}

/// Decode analyzer stdout. Blank output means no diagnostics.
pub fn parse_raw_diagnostics(stdout: &str) -> Result<Vec<RawDiagnostic>, LintError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    Ok(match serde_json::from_str(trimmed)? {
        RawPayload::List(items) => items,
        RawPayload::Map(items) => items.into_values().collect(),
    })
}

/// What a `check` invocation reads.
#[derive(Debug, Clone, Copy)]
pub enum CheckTarget<'a> {
    /// Buffer text on stdin, attributed to this path.
    Stdin(&'a Path),
    /// Everything under a workspace root, read from disk.
    Root(&'a Path),
}

/// Build `ruff check` arguments from the configuration.
#[must_use]
pub fn check_args(config: &LinterConfig, target: CheckTarget<'_>, fix: bool) -> Vec<String> {
    let mut args = vec![
        "check".to_string(),
        "--quiet".to_string(),
        "--output-format=json".to_string(),
    ];
    match target {
        CheckTarget::Stdin(path) => args.push(format!("--stdin-filename={}", path.display())),
        CheckTarget::Root(root) => args.push(root.display().to_string()),
    }

    if let Some(path) = &config.config_path {
        args.push(format!("--config={}", path.display()));
    }
    for (flag, codes) in [
        ("select", &config.select),
        ("ignore", &config.ignore),
        ("fixable", &config.fixable),
        ("unfixable", &config.unfixable),
    ] {
        if !codes.is_empty() {
            args.push(format!("--{flag}={}", codes.join(",")));
        }
    }
    if !config.use_noqa {
        args.push("--ignore-noqa".to_string());
    }
    if let Some(version) = config.target_version.as_deref().filter(|v| !v.is_empty()) {
        args.push(format!("--target-version={version}"));
    }
    if fix {
        args.push("--fix-only".to_string());
    }
    args
}

/// Build `ruff format` arguments for text streamed on stdin.
#[must_use]
pub fn format_args(path: &Path) -> Vec<String> {
    vec![
        "format".to_string(),
        format!("--stdin-filename={}", path.display()),
        "--quiet".to_string(),
    ]
}
