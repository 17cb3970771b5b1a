//! Configuration loading, parsing, and persistence for ruffline.
//!
//! ```toml
//! enabled = true
//! executable = "ruff"
//! target_version = "py312"
//! use_noqa = true
//! mark_uncategorized = true
//! allow_magic = false
//! select = ["E", "F", "W"]
//!
//! [severity]
//! error = ["E", "F"]
//! warning = ["W"]
//! info = ["D"]
//!
//! [process]
//! timeout_secs = 100
//! ```

mod atomic_write;

pub use atomic_write::atomic_write;

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use serde::Deserialize;

pub use ruffline_types::SeverityRules;
use ruffline_types::ANALYZER;

/// Default wall-clock budget for one analyzer invocation.
pub const DEFAULT_TIMEOUT_SECS: u64 = 100;

/// Default cap on captured analyzer output, per stream.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to edit config at {}: {source}", path.display())]
    Edit {
        path: PathBuf,
        source: toml_edit::TomlError,
    },
    #[error("failed to write config at {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("could not determine home directory")]
    NoHomeDir,
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Edit { path, .. }
            | ConfigError::Write { path, .. } => Some(path),
            ConfigError::NoHomeDir => None,
        }
    }
}

/// Linter settings consumed by the buffer linter, project scanner and formatter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinterConfig {
    /// Global on/off switch. Disabled linting yields empty results.
    pub enabled: bool,
    /// Analyzer executable, resolved through `PATH` when not absolute.
    pub executable: String,
    /// Explicit ruff configuration file, passed as `--config`.
    pub config_path: Option<PathBuf>,
    /// Minimum Python version, passed as `--target-version`.
    pub target_version: Option<String>,
    /// Honor `# noqa` comments. When false, `--ignore-noqa` is passed.
    pub use_noqa: bool,
    /// Append `*` to codes that no severity list matched.
    pub mark_uncategorized: bool,
    /// Mask IPython magics and introspection before analysis.
    pub allow_magic: bool,
    pub select: Vec<String>,
    pub ignore: Vec<String>,
    pub fixable: Vec<String>,
    pub unfixable: Vec<String>,
    pub severity: SeverityRules,
    pub process: ProcessConfig,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            executable: ANALYZER.to_string(),
            config_path: None,
            target_version: None,
            use_noqa: true,
            mark_uncategorized: true,
            allow_magic: false,
            select: Vec::new(),
            ignore: Vec::new(),
            fixable: Vec::new(),
            unfixable: Vec::new(),
            severity: SeverityRules::default(),
            process: ProcessConfig::default(),
        }
    }
}

/// Resource limits for one analyzer invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub timeout_secs: u64,
    pub max_output_bytes: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl ProcessConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Boolean settings that can be flipped from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Enabled,
    UseNoqa,
}

impl Toggle {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::UseNoqa => "use_noqa",
        }
    }

    const fn default_value(self) -> bool {
        match self {
            Self::Enabled | Self::UseNoqa => true,
        }
    }
}

/// Replace `${VAR}` references with environment values. Unset variables
/// expand to the empty string.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn expand_path(path: &Path) -> PathBuf {
    let expanded = expand_env_vars(&path.to_string_lossy());
    match expanded.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(&expanded)),
        None => PathBuf::from(expanded),
    }
}

impl LinterConfig {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::parse(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Parse TOML content and expand environment references.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let config: Self = toml::from_str(content)?;
        Ok(config.with_expanded_env())
    }

    #[must_use]
    fn with_expanded_env(mut self) -> Self {
        self.executable = expand_env_vars(&self.executable);
        self.config_path = self.config_path.as_deref().map(expand_path);
        self
    }

    /// Flip a boolean setting in the config file at `path` and persist it.
    ///
    /// Uses `toml_edit` to preserve comments and formatting. Creates the file
    /// and its parent directory if they don't exist. Returns the new value.
    pub fn toggle(path: &Path, toggle: Toggle) -> Result<bool, ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content = if path.exists() {
            fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            String::new()
        };

        let mut doc = content
            .parse::<toml_edit::DocumentMut>()
            .map_err(|source| ConfigError::Edit {
                path: path.to_path_buf(),
                source,
            })?;

        let current = doc
            .get(toggle.key())
            .and_then(toml_edit::Item::as_bool)
            .unwrap_or(toggle.default_value());
        let next = !current;
        doc[toggle.key()] = toml_edit::value(next);

        atomic_write(path, doc.to_string().as_bytes()).map_err(write_err)?;
        tracing::info!(path = %path.display(), key = toggle.key(), value = next, "Config updated");
        Ok(next)
    }
}

/// Default config file location: `~/.ruffline/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ruffline").join("config.toml"))
}

/// Config path or an error when no home directory can be determined.
pub fn require_config_path() -> Result<PathBuf, ConfigError> {
    config_path().ok_or(ConfigError::NoHomeDir)
}

/// Location of ruff's own user-level configuration
/// (`%APPDATA%\ruff\pyproject.toml` on Windows, `~/.config/ruff/pyproject.toml` on Linux).
#[must_use]
pub fn default_ruff_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(ANALYZER).join("pyproject.toml"))
}
