// src/exec.rs

//! External command execution
//!
//! Every tool the builder drives (version control, patching, the shell for
//! build steps, the image builder) is launched through [`CommandRunner`].
//! Each invocation carries its own working directory; nothing relies on the
//! process-wide current directory.
//!
//! [`ProcessRunner`] is the real implementation. It streams child output into
//! the log line by line, enforces an optional timeout and honours a
//! [`CancelToken`] while the child runs.
//!
//! Each child leads its own process group. A timeout or cancellation kills the
//! whole group, so processes a build step backgrounded go with it. Output
//! pipes held open by a background process that outlives a successful child
//! are abandoned after a short grace period instead of waited on.

use crate::error::CommandFailure;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// How often a running child is checked for timeout and cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long to wait for output to drain once the child has exited
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Outcome of running an external command
pub type CommandResult = std::result::Result<(), CommandFailure>;

/// Cooperative cancellation flag shared between the caller and a build
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the build holding this token
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A single external command: program, arguments and working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs external commands on behalf of the pipeline stages
pub trait CommandRunner: Send + Sync {
    /// Run `invocation` to completion. `stage` labels the streamed output.
    ///
    /// Succeeds only when the process exits with status 0.
    fn run(&self, stage: &str, invocation: &Invocation) -> CommandResult;
}

/// Runs commands as blocking child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
    cancel: CancelToken,
}

impl ProcessRunner {
    /// Create a runner. `timeout` of `None` lets commands run indefinitely.
    pub fn new(timeout: Option<Duration>, cancel: CancelToken) -> Self {
        Self { timeout, cancel }
    }

    fn wait(
        &self,
        child: &mut Child,
        started: Instant,
    ) -> std::result::Result<ExitStatus, CommandFailure> {
        loop {
            if self.cancel.is_cancelled() {
                kill(child);
                return Err(CommandFailure::Cancelled);
            }
            if let Some(limit) = self.timeout
                && started.elapsed() >= limit
            {
                kill(child);
                return Err(CommandFailure::TimedOut(limit));
            }
            if let Some(status) = child.wait_timeout(POLL_INTERVAL).map_err(CommandFailure::Io)? {
                return Ok(status);
            }
        }
    }

    /// Wait for the output readers to hit EOF, bounded by the deadline
    fn drain(&self, stage: &str, done: &Receiver<()>, readers: usize, started: Instant) {
        let mut budget = DRAIN_GRACE;
        if let Some(limit) = self.timeout {
            budget = budget.min(limit.saturating_sub(started.elapsed()));
        }
        let deadline = Instant::now() + budget;

        for _ in 0..readers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if done.recv_timeout(remaining).is_err() {
                warn!(
                    "[{}] output still open after exit, a background process may be holding it",
                    stage
                );
                return;
            }
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, stage: &str, invocation: &Invocation) -> CommandResult {
        info!("[{}] $ {}", stage, invocation);
        debug!("[{}] cwd: {}", stage, invocation.cwd.display());

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .map_err(CommandFailure::Spawn)?;
        let started = Instant::now();

        let (done_tx, done_rx) = mpsc::channel();
        let mut readers = 0;
        if let Some(out) = child.stdout.take() {
            stream_lines(stage.to_string(), out, false, done_tx.clone());
            readers += 1;
        }
        if let Some(err) = child.stderr.take() {
            stream_lines(stage.to_string(), err, true, done_tx.clone());
            readers += 1;
        }
        drop(done_tx);

        let status = self.wait(&mut child, started)?;
        self.drain(stage, &done_rx, readers, started);

        status_to_result(status)
    }
}

/// Kill the child and everything in its process group
fn kill(child: &mut Child) {
    if let Ok(pid) = i32::try_from(child.id()) {
        let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn status_to_result(status: ExitStatus) -> CommandResult {
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(CommandFailure::Exit(code)),
        None => Err(CommandFailure::Signal(status.signal())),
    }
}

/// Forward each line of a child's output stream to the log
///
/// Signals `done` at EOF. The thread is never joined.
fn stream_lines<R>(stage: String, reader: R, is_stderr: bool, done: Sender<()>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        for line in BufReader::new(reader).lines() {
            let Ok(line) = line else { break };
            if is_stderr {
                warn!("[{}] {}", stage, line);
            } else {
                info!("[{}] {}", stage, line);
            }
        }
        let _ = done.send(());
    });
}
