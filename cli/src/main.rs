mod render;

use std::env;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use ruffline_config::{
    LinterConfig, Toggle, atomic_write, config_path, default_ruff_config_path, require_config_path,
};
use ruffline_lint::{
    BufferDocument, BufferLinter, Document, Formatter, LintMode, LintOutcome, MemoryReporter,
    ProjectScanner, Reporter, ScanOutcome,
};
use ruffline_types::Diagnostic;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(
    name = "ruffline",
    version,
    about = "Editor-style diagnostics from the ruff Python linter",
    propagate_version = true
)]
struct Cli {
    #[arg(short, long, action = ArgAction::Count, global = true, help = "Increase log verbosity")]
    verbose: u8,
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Config file (default: ~/.ruffline/config.toml)"
    )]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lint one file the way an open editor buffer is linted.
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, help = "Print diagnostics as JSON")]
        json: bool,
    },
    /// Apply ruff's fixes to one file.
    Fix {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, help = "Print a diff instead of writing the file")]
        diff: bool,
    },
    /// Format one file with `ruff format`.
    Format {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(
            long,
            value_name = "START:END",
            value_parser = parse_line_range,
            help = "Format only these lines (1-based, inclusive)"
        )]
        lines: Option<RangeInclusive<usize>>,
        #[arg(long, help = "Print a diff instead of writing the file")]
        diff: bool,
    },
    /// Check whole workspace roots from disk.
    Scan {
        #[arg(value_name = "ROOT", help = "Workspace roots (default: current directory)")]
        roots: Vec<PathBuf>,
        #[arg(
            long = "open",
            value_name = "PATH",
            help = "Files to lint as open buffers instead"
        )]
        open: Vec<PathBuf>,
        #[arg(long, help = "Print diagnostics as JSON")]
        json: bool,
    },
    /// Inspect or edit the configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location.
    Path,
    /// Print the location of ruff's user-level configuration.
    RuffPath,
    /// Flip a boolean setting and save it.
    Toggle {
        #[arg(value_enum)]
        setting: Setting,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Setting {
    Enabled,
    Noqa,
}

impl From<Setting> for Toggle {
    fn from(setting: Setting) -> Self {
        match setting {
            Setting::Enabled => Toggle::Enabled,
            Setting::Noqa => Toggle::UseNoqa,
        }
    }
}

/// `START:END`, 1-based and inclusive, into a 0-based line range.
fn parse_line_range(value: &str) -> Result<RangeInclusive<usize>, String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got `{value}`"))?;
    let line = |raw: &str| {
        raw.trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid line number `{raw}`"))
    };
    let (start, end) = (line(start)?, line(end)?);
    if start > end {
        return Err(format!("start line {start} is after end line {end}"));
    }
    Ok(start - 1..=end - 1)
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(level)
    });
    if let Err(e) = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("warning: logging unavailable: {e}");
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_file = cli.config.as_deref();
    match cli.command {
        Command::Check { file, json } => check(load_config(config_file)?, &file, json).await,
        Command::Fix { file, diff } => fix(load_config(config_file)?, &file, diff).await,
        Command::Format { file, lines, diff } => {
            format(load_config(config_file)?, &file, lines, diff).await
        }
        Command::Scan { roots, open, json } => {
            scan(load_config(config_file)?, roots, open, json).await
        }
        Command::Config { action } => config_command(config_file, action),
    }
}

fn load_config(path: Option<&Path>) -> Result<LinterConfig> {
    let config = match path {
        Some(path) => LinterConfig::load_from(path),
        None => LinterConfig::load(),
    };
    config.context("failed to load configuration")
}

fn read_document(file: &Path) -> Result<BufferDocument> {
    let path = std::path::absolute(file)
        .with_context(|| format!("invalid path {}", file.display()))?;
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(BufferDocument::new(path, text))
}

fn exit_code(has_errors: bool) -> ExitCode {
    if has_errors {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn any_error<'a>(mut diagnostics: impl Iterator<Item = &'a Diagnostic>) -> bool {
    diagnostics.any(|d| d.severity().is_error())
}

async fn check(config: LinterConfig, file: &Path, json: bool) -> Result<ExitCode> {
    let mut doc = read_document(file)?;
    let linter = BufferLinter::new(config);
    let LintOutcome::Diagnostics(diagnostics) =
        linter.lint(&mut doc, LintMode::Diagnostics).await?
    else {
        return Ok(ExitCode::SUCCESS);
    };

    if json {
        println!("{}", render::diagnostics_json(&diagnostics)?);
    } else {
        print!("{}", render::diagnostic_lines(&diagnostics));
    }
    Ok(exit_code(any_error(diagnostics.iter())))
}

async fn fix(config: LinterConfig, file: &Path, diff: bool) -> Result<ExitCode> {
    let mut doc = read_document(file)?;
    let original = doc.text().to_string();
    BufferLinter::new(config)
        .lint(&mut doc, LintMode::Fix)
        .await?;
    write_back(&doc, &original, diff)
}

async fn format(
    config: LinterConfig,
    file: &Path,
    lines: Option<RangeInclusive<usize>>,
    diff: bool,
) -> Result<ExitCode> {
    let mut doc = read_document(file)?;
    let original = doc.text().to_string();
    let formatter = Formatter::new(config);
    match lines {
        Some(lines) => formatter.format_selection(&mut doc, lines).await?,
        None => formatter.format_document(&mut doc).await?,
    };
    write_back(&doc, &original, diff)
}

/// Persist a rewritten document, or print what would change.
fn write_back(doc: &BufferDocument, original: &str, diff: bool) -> Result<ExitCode> {
    if doc.text() == original {
        tracing::info!(path = %doc.path().display(), "No changes");
        return Ok(ExitCode::SUCCESS);
    }
    if diff {
        print!("{}", render::unified_diff(doc.path(), original, doc.text()));
        return Ok(ExitCode::SUCCESS);
    }
    atomic_write(doc.path(), doc.text().as_bytes())
        .with_context(|| format!("failed to write {}", doc.path().display()))?;
    tracing::info!(path = %doc.path().display(), "Rewrote file");
    Ok(ExitCode::SUCCESS)
}

async fn scan(
    config: LinterConfig,
    roots: Vec<PathBuf>,
    open: Vec<PathBuf>,
    json: bool,
) -> Result<ExitCode> {
    let roots = if roots.is_empty() {
        vec![env::current_dir().context("failed to determine current directory")?]
    } else {
        absolute_all(&roots)?
    };
    let open = absolute_all(&open)?;

    let project = Arc::new(MemoryReporter::new());
    let scanner = ProjectScanner::new(config.clone(), Arc::clone(&project));
    match scanner.scan(&roots, &open).await {
        ScanOutcome::Failed => bail!("project scan failed (rerun with -v for details)"),
        ScanOutcome::Busy | ScanOutcome::NoRoots | ScanOutcome::Completed { .. } => {}
    }

    // Open files are linted from their buffers on a separate channel.
    let buffers = MemoryReporter::new();
    let linter = BufferLinter::new(config);
    for path in &open {
        scanner.clear_file_messages(path);
        let mut doc = read_document(path)?;
        if let LintOutcome::Diagnostics(items) = linter.lint(&mut doc, LintMode::Diagnostics).await? {
            buffers.set_messages(doc.path(), items);
        }
    }

    let project = project.snapshot();
    let buffers = buffers.snapshot();
    if json {
        println!("{}", render::scan_json(&project, &buffers)?);
    } else {
        print!("{}", render::snapshot_lines(&project));
        print!("{}", render::snapshot_lines(&buffers));
        let status = render::status_line(&project, &buffers);
        if !status.is_empty() {
            eprintln!("{status}");
        }
    }

    let has_errors = [&project, &buffers]
        .into_iter()
        .any(|snapshot| snapshot.error_count() > 0);
    Ok(exit_code(has_errors))
}

fn absolute_all(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    paths
        .iter()
        .map(|path| {
            std::path::absolute(path).with_context(|| format!("invalid path {}", path.display()))
        })
        .collect()
}

fn config_command(config_file: Option<&Path>, action: ConfigAction) -> Result<ExitCode> {
    match action {
        ConfigAction::Path => {
            let path = config_file
                .map(Path::to_path_buf)
                .or_else(config_path)
                .context("cannot determine home directory")?;
            println!("{}", path.display());
        }
        ConfigAction::RuffPath => {
            let path = default_ruff_config_path().context("cannot determine config directory")?;
            println!("{}", path.display());
        }
        ConfigAction::Toggle { setting } => {
            let path = match config_file {
                Some(path) => path.to_path_buf(),
                None => require_config_path()?,
            };
            let toggle = Toggle::from(setting);
            let value = LinterConfig::toggle(&path, toggle)?;
            println!("{} = {value}", toggle.key());
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from([
            "ruffline", "-vv", "scan", "/ws1", "/ws2", "--open", "/ws1/a.py", "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Scan { roots, open, json } = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(roots, vec![PathBuf::from("/ws1"), PathBuf::from("/ws2")]);
        assert_eq!(open, vec![PathBuf::from("/ws1/a.py")]);
        assert!(json);
    }

    #[test]
    fn test_parse_config_toggle() {
        let cli = Cli::try_parse_from([
            "ruffline", "config", "toggle", "noqa", "--config", "/tmp/c.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        let Command::Config {
            action: ConfigAction::Toggle { setting },
        } = cli.command
        else {
            panic!("expected config toggle");
        };
        assert_eq!(Toggle::from(setting), Toggle::UseNoqa);
        assert!(Cli::try_parse_from(["ruffline", "config", "ruff-path"]).is_ok());
        assert!(Cli::try_parse_from(["ruffline", "config", "toggle", "other"]).is_err());
    }

    #[test]
    fn test_parse_format_lines() {
        let cli =
            Cli::try_parse_from(["ruffline", "format", "a.py", "--lines", "3:7", "--diff"]).unwrap();
        let Command::Format { file, lines, diff } = cli.command else {
            panic!("expected format");
        };
        assert_eq!(file, PathBuf::from("a.py"));
        assert_eq!(lines, Some(2..=6));
        assert!(diff);

        let cli = Cli::try_parse_from(["ruffline", "format", "a.py"]).unwrap();
        assert!(matches!(cli.command, Command::Format { lines: None, .. }));
    }

    #[test]
    fn test_parse_line_range_rejects_bad_input() {
        assert_eq!(parse_line_range("4:4"), Ok(3..=3));
        assert!(parse_line_range("4").is_err());
        assert!(parse_line_range("0:2").is_err());
        assert!(parse_line_range("5:2").is_err());
        assert!(parse_line_range("a:b").is_err());
        assert!(Cli::try_parse_from(["ruffline", "format", "a.py", "--lines", "9:1"]).is_err());
    }

    #[test]
    fn test_read_document_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, "import os\n").unwrap();
        let doc = read_document(&file).unwrap();
        assert!(doc.path().is_absolute());
        assert_eq!(doc.text(), "import os\n");
        assert!(read_document(&dir.path().join("missing.py")).is_err());
    }

    #[test]
    fn test_write_back_persists_changes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, "x=1\n").unwrap();

        let doc = BufferDocument::new(&file, "x = 1\n");
        write_back(&doc, "x=1\n", true).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "x=1\n");

        write_back(&doc, "x=1\n", false).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "x = 1\n");
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        fs::write(&file, "allow_magic = true\n[severity]\nerror = [\"F\"]\n").unwrap();
        let config = load_config(Some(file.as_path())).unwrap();
        assert!(config.allow_magic);
        assert_eq!(config.severity.error, vec!["F".to_string()]);
        assert!(load_config(Some(dir.path().join("missing.toml").as_path())).is_err());
    }
}
