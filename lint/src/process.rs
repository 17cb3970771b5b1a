//! Analyzer invocation: one child process per request, bounded in time and output.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use ruffline_config::ProcessConfig;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::time;

use crate::error::LintError;

/// Exit codes that mean the analyzer ran: 0 (clean) and 1 (violations found).
const ACCEPTED_EXIT_CODES: [i32; 2] = [0, 1];

const READ_CHUNK_BYTES: usize = 8192;

/// How the analyzer receives the text to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Write the payload to stdin, then close it.
    Stdin(String),
    /// The target path is already in argv; stdin is not connected.
    OnDisk,
}

/// A fully described analyzer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub input: Input,
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, limits: ProcessConfig) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
            input: Input::OnDisk,
            timeout: limits.timeout(),
            max_output_bytes: limits.max_output_bytes,
        }
    }

    #[must_use]
    pub fn cwd(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    #[must_use]
    pub fn stdin(mut self, text: String) -> Self {
        self.input = Input::Stdin(text);
        self
    }
}

/// Captured stdout of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    #[must_use]
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
        }
    }
}

/// Future returned by [`Runner::run`].
pub type RunFut<'a> = Pin<Box<dyn Future<Output = Result<ProcessOutput, LintError>> + Send + 'a>>;

/// Executes analyzer invocations. The result is available exactly once.
pub trait Runner: Send + Sync {
    fn run(&self, invocation: Invocation) -> RunFut<'_>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&self, invocation: Invocation) -> RunFut<'_> {
        Box::pin(run_process(invocation))
    }
}

async fn run_process(invocation: Invocation) -> Result<ProcessOutput, LintError> {
    let program = invocation.program.clone();
    let resolved = which::which(&program).map_err(|e| LintError::Spawn {
        program: program.clone(),
        source: io::Error::new(io::ErrorKind::NotFound, e),
    })?;

    let mut cmd = Command::new(&resolved);
    cmd.args(&invocation.args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &invocation.cwd {
        cmd.current_dir(cwd);
    }
    let payload = match invocation.input {
        Input::Stdin(text) => {
            cmd.stdin(Stdio::piped());
            Some(text)
        }
        Input::OnDisk => {
            cmd.stdin(Stdio::null());
            None
        }
    };

    tracing::debug!(
        program = %resolved.display(),
        args = ?invocation.args,
        cwd = ?invocation.cwd,
        "Running analyzer"
    );

    let mut child = cmd.spawn().map_err(|source| LintError::Spawn {
        program: program.clone(),
        source,
    })?;

    let io_err = |source| LintError::Io {
        program: program.clone(),
        source,
    };
    let stdin = child.stdin.take();
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io_err(io::Error::other("stdout not captured")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io_err(io::Error::other("stderr not captured")))?;

    let limit = invocation.max_output_bytes;
    let feed = async move {
        let (Some(mut stdin), Some(text)) = (stdin, payload) else {
            return;
        };
        // A child that exits early closes the pipe; its stderr explains why.
        if let Err(e) = stdin.write_all(text.as_bytes()).await {
            tracing::debug!("Analyzer stdin closed early: {e}");
        }
        drop(stdin);
    };

    let collected = time::timeout(invocation.timeout, async {
        tokio::try_join!(
            async {
                feed.await;
                Ok::<(), ReadFailure>(())
            },
            read_to_end_limited(stdout, limit),
            read_to_end_limited(stderr, limit),
            async { child.wait().await.map_err(ReadFailure::Io) },
        )
    })
    .await;

    let (stdout, stderr, status) = match collected {
        Ok(Ok(((), stdout, stderr, status))) => (stdout, stderr, status),
        Ok(Err(failure)) => {
            kill(&mut child, &program);
            return Err(match failure {
                ReadFailure::Overflow => LintError::OutputLimit { program, limit },
                ReadFailure::Io(source) => LintError::Io { program, source },
            });
        }
        Err(_) => {
            kill(&mut child, &program);
            return Err(LintError::Timeout {
                program,
                elapsed: invocation.timeout,
            });
        }
    };

    // Any stderr output at all means the run failed, even pure whitespace.
    let stderr = String::from_utf8_lossy(&stderr);
    if !stderr.is_empty() {
        return Err(LintError::Stderr {
            program,
            stderr: stderr.trim().to_string(),
        });
    }

    if !status
        .code()
        .is_some_and(|code| ACCEPTED_EXIT_CODES.contains(&code))
    {
        return Err(LintError::ExitStatus { program, status });
    }

    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        exit_code: status.code(),
    })
}

fn kill(child: &mut Child, program: &str) {
    if let Err(e) = child.start_kill() {
        tracing::debug!("Failed to kill {program}: {e}");
    }
}

/// Why collecting a child's output stopped early.
#[derive(Debug)]
enum ReadFailure {
    Io(io::Error),
    /// A stream went past the byte cap.
    Overflow,
}

/// Read a stream to EOF, keeping at most `max_bytes`.
///
/// Crossing the limit fails right away so the caller can kill the child.
async fn read_to_end_limited<R: AsyncRead + Unpin>(
    mut reader: R,
    max_bytes: usize,
) -> Result<Vec<u8>, ReadFailure> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; READ_CHUNK_BYTES];

    loop {
        let n = reader.read(&mut tmp).await.map_err(ReadFailure::Io)?;
        if n == 0 {
            return Ok(buf);
        }
        if buf.len() + n > max_bytes {
            return Err(ReadFailure::Overflow);
        }
        buf.extend_from_slice(&tmp[..n]);
    }
}
