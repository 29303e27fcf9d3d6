//! Subprocess execution engine.
//!
//! A [`Process`] describes one invocation of an external program: its
//! arguments, working directory, environment overrides, the bytes fed to its
//! standard input and an optional time limit. Running it spawns the child with
//! all three standard streams piped and then drives four futures at once:
//!
//! - writing the input bytes to stdin (then closing it so the child sees EOF)
//! - draining stdout
//! - draining stderr
//! - waiting for the child to exit
//!
//! Because no direction waits on another, a child that produces a lot of
//! output before it has consumed all of its input cannot deadlock against us.
//!
//! A nonzero exit is not an error at this layer. It is returned as data in
//! [`ProcessOutput`] for the caller to interpret. Only failing to spawn, I/O
//! failures on the pipes, and exceeding the time limit are errors.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tracing::{debug, warn};

/// Errors that can occur while running a subprocess.
#[derive(Debug, Error)]
pub enum ProcessError {
  /// The program could not be started (not found, not executable, ...).
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// Reading from or writing to the child's pipes failed.
  #[error("i/o error while running {program}: {source}")]
  Io {
    program: String,
    #[source]
    source: io::Error,
  },

  /// The child exceeded its time limit and was killed.
  #[error("{program} did not finish within {after:?} and was killed")]
  Timeout { program: String, after: Duration },

  /// The runtime driving a blocking `start` could not be created.
  #[error("failed to create process runtime: {0}")]
  Runtime(#[source] io::Error),
}

/// How a child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
  /// Normal termination with an exit code.
  Exited(i32),
  /// Killed by a signal.
  Signaled(i32),
}

impl ExitStatus {
  pub fn success(&self) -> bool {
    matches!(self, ExitStatus::Exited(0))
  }

  pub fn code(&self) -> Option<i32> {
    match self {
      ExitStatus::Exited(code) => Some(*code),
      ExitStatus::Signaled(_) => None,
    }
  }

  pub fn signal(&self) -> Option<i32> {
    match self {
      ExitStatus::Exited(_) => None,
      ExitStatus::Signaled(signal) => Some(*signal),
    }
  }
}

impl From<std::process::ExitStatus> for ExitStatus {
  fn from(status: std::process::ExitStatus) -> Self {
    if let Some(code) = status.code() {
      return ExitStatus::Exited(code);
    }

    #[cfg(unix)]
    {
      use std::os::unix::process::ExitStatusExt;
      if let Some(signal) = status.signal() {
        return ExitStatus::Signaled(signal);
      }
    }

    // No code and no signal: stopped/continued states never reach us after wait
    ExitStatus::Exited(-1)
  }
}

impl fmt::Display for ExitStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExitStatus::Exited(code) => write!(f, "exit code {}", code),
      ExitStatus::Signaled(signal) => write!(f, "signal {}", signal),
    }
  }
}

/// Everything a finished child left behind.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
  pub status: ExitStatus,
  pub stdout: Vec<u8>,
  pub stderr: Vec<u8>,
}

impl ProcessOutput {
  pub fn success(&self) -> bool {
    self.status.success()
  }

  pub fn stdout_lossy(&self) -> String {
    String::from_utf8_lossy(&self.stdout).into_owned()
  }

  pub fn stderr_lossy(&self) -> String {
    String::from_utf8_lossy(&self.stderr).into_owned()
  }
}

/// One subprocess invocation.
///
/// `run` and `start` consume the value, so an instance executes at most once.
#[derive(Debug, Clone)]
pub struct Process {
  program: PathBuf,
  args: Vec<OsString>,
  working_dir: Option<PathBuf>,
  env: BTreeMap<OsString, OsString>,
  input: Vec<u8>,
  timeout: Option<Duration>,
}

impl Process {
  /// Create a process for `program`.
  ///
  /// A bare name (no path separator) is looked up in `PATH`.
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      working_dir: None,
      env: BTreeMap::new(),
      input: Vec::new(),
      timeout: None,
    }
  }

  pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
    self.args.push(arg.as_ref().to_os_string());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    self.args.extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
    self
  }

  /// Run the child in `dir` instead of the current directory.
  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.working_dir = Some(dir.into());
    self
  }

  /// Set an environment variable for the child, on top of the inherited environment.
  pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
    self
      .env
      .insert(key.as_ref().to_os_string(), value.as_ref().to_os_string());
    self
  }

  /// Bytes written to the child's standard input.
  pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
    self.input = input.into();
    self
  }

  /// Kill the child if it has not exited after `limit`.
  pub fn timeout(mut self, limit: Option<Duration>) -> Self {
    self.timeout = limit;
    self
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  pub fn arguments(&self) -> &[OsString] {
    &self.args
  }

  pub fn working_dir(&self) -> Option<&Path> {
    self.working_dir.as_deref()
  }

  /// Run the process to completion, blocking the calling thread.
  ///
  /// This drives [`Process::run`] on a private single-threaded runtime. When
  /// the caller is already inside a tokio runtime, that private runtime runs
  /// on a helper thread instead, since runtimes cannot nest. Async callers
  /// should still prefer `run`, which does not block a worker.
  pub fn start(self) -> Result<ProcessOutput, ProcessError> {
    if tokio::runtime::Handle::try_current().is_err() {
      return self.block_on();
    }

    debug!(program = %self.program.display(), "inside a runtime, running on a helper thread");
    std::thread::scope(|scope| {
      scope
        .spawn(move || self.block_on())
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    })
  }

  fn block_on(self) -> Result<ProcessOutput, ProcessError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .map_err(ProcessError::Runtime)?;

    runtime.block_on(self.run())
  }

  /// Run the process to completion.
  pub async fn run(self) -> Result<ProcessOutput, ProcessError> {
    let program = self.program.display().to_string();

    let mut command = Command::new(&self.program);
    command
      .args(&self.args)
      .envs(&self.env)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    if let Some(dir) = &self.working_dir {
      command.current_dir(dir);
    }

    // Own process group, so a timeout also reaches whatever the child spawned
    #[cfg(unix)]
    command.process_group(0);

    debug!(
      program = %program,
      args = ?self.args,
      working_dir = ?self.working_dir,
      input_len = self.input.len(),
      "spawning process"
    );

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
      program: program.clone(),
      source,
    })?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let exchange = async {
      let (fed, out, err, status) = tokio::join!(feed(stdin, &self.input), drain(stdout), drain(stderr), child.wait());
      fed?;
      Ok::<_, io::Error>(ProcessOutput {
        status: status?.into(),
        stdout: out?,
        stderr: err?,
      })
    };

    let outcome = match self.timeout {
      Some(limit) => tokio::time::timeout(limit, exchange).await.ok(),
      None => Some(exchange.await),
    };

    let Some(result) = outcome else {
      let after = self.timeout.unwrap_or_default();
      warn!(program = %program, ?after, "process timed out, killing");

      #[cfg(unix)]
      if let Some(pid) = child.id() {
        kill_group(&program, pid);
      }
      if let Err(e) = child.start_kill() {
        debug!(program = %program, error = %e, "kill failed, child already gone");
      }
      // Reap so the child does not linger as a zombie
      if let Err(e) = child.wait().await {
        debug!(program = %program, error = %e, "failed to reap killed child");
      }

      return Err(ProcessError::Timeout { program, after });
    };

    let output = result.map_err(|source| ProcessError::Io {
      program: program.clone(),
      source,
    })?;

    debug!(
      program = %program,
      status = %output.status,
      stdout_len = output.stdout.len(),
      stderr_len = output.stderr.len(),
      "process finished"
    );

    Ok(output)
  }
}

/// Write all of `input` to the child, then close the pipe.
async fn feed(stdin: Option<ChildStdin>, input: &[u8]) -> io::Result<()> {
  let Some(mut stdin) = stdin else {
    return Ok(());
  };

  match stdin.write_all(input).await {
    Ok(()) => {}
    // The child exited or closed stdin early; its output is still drained
    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
    Err(e) => return Err(e),
  }

  drop(stdin);
  Ok(())
}

/// SIGKILL every process in the group led by `pid`.
#[cfg(unix)]
fn kill_group(program: &str, pid: u32) {
  use rustix::process::{Pid, Signal, kill_process_group};

  let Some(pid) = i32::try_from(pid).ok().and_then(Pid::from_raw) else {
    return;
  };
  if let Err(e) = kill_process_group(pid, Signal::KILL) {
    debug!(program = %program, error = %e, "failed to kill process group");
  }
}

/// Read a pipe until EOF.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
  let mut buffer = Vec::new();
  if let Some(mut pipe) = pipe {
    pipe.read_to_end(&mut buffer).await?;
  }
  Ok(buffer)
}
