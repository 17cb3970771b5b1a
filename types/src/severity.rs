//! Severity levels and the prefix cascade that assigns them.

use serde::{Deserialize, Serialize};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Three independently configured prefix lists, checked error → warning → info.
///
/// A list matches a code when the code starts with any of its prefixes.
/// Lists are never merged, so a user can edit one without touching the others.
///
/// ```toml
/// [severity]
/// error = ["E", "F"]
/// warning = ["W", "C", "B", "N"]
/// info = ["D", "I", "UP"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityRules {
    pub error: Vec<String>,
    pub warning: Vec<String>,
    pub info: Vec<String>,
}

impl Default for SeverityRules {
    fn default() -> Self {
        Self {
            error: strings(&["E", "F"]),
            warning: strings(&["W", "C", "B", "N"]),
            info: strings(&["D", "I", "UP"]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn matches_any(prefixes: &[String], code: &str) -> bool {
    prefixes.iter().any(|prefix| code.starts_with(prefix.as_str()))
}

impl SeverityRules {
    #[must_use]
    pub fn new(error: Vec<String>, warning: Vec<String>, info: Vec<String>) -> Self {
        Self {
            error,
            warning,
            info,
        }
    }

    /// Rules with every list empty; every code is unmatched.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    /// Classify a diagnostic code. `None` means no list matched; the
    /// translator decides the fallback.
    #[must_use]
    pub fn classify(&self, code: &str) -> Option<Severity> {
        [
            (Severity::Error, &self.error),
            (Severity::Warning, &self.warning),
            (Severity::Info, &self.info),
        ]
        .into_iter()
        .find(|(_, prefixes)| matches_any(prefixes, code))
        .map(|(severity, _)| severity)
    }
}
