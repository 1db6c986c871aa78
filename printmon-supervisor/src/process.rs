//! The single supervised print-server process.
//!
//! At most one child exists per [`SupervisedProcess`]. Start and stop are
//! serialized end to end by one async lock; the child handle itself sits
//! behind a short synchronous lock so liveness checks never wait on a
//! pending stop and never see a half-written slot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::Instant;

use printmon_core::ServerSettings;

use crate::error::SupervisorError;

/// Buffered output lines between the stream pumps and the relay.
const OUTPUT_CAPACITY: usize = 1024;

/// `try_wait` cadence while waiting for a signalled child to exit.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Upper bound on reaping after a forceful kill.
const KILL_REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything needed to launch the print server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub script: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub stop_timeout: Duration,
}

impl LaunchSpec {
    /// Resolve the configured entry point against `cwd`.
    pub fn from_settings(settings: &ServerSettings, cwd: &Path) -> Self {
        Self {
            program: settings.interpreter.clone(),
            script: cwd.join(&settings.script),
            args: settings.args.clone(),
            env: settings.env.clone(),
            stop_timeout: settings.stop_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { pid: Option<u32> },
    AlreadyRunning { pid: Option<u32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No handle was recorded.
    NotRunning,
    /// The handle was stale; the process had already exited on its own.
    AlreadyExited { code: Option<i32> },
    /// Exited within the grace period after the termination request.
    Exited { code: Option<i32> },
    /// Grace period elapsed (or signalling failed); the process was killed.
    Killed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Absent,
    Running { pid: Option<u32> },
    Exited { code: Option<i32> },
}

/// Result of one timed read from the merged output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Nothing arrived within the wait.
    Idle,
    /// Both output streams of the current process have closed, or no process
    /// was ever started.
    Closed,
}

pub struct SupervisedProcess {
    spec: LaunchSpec,
    transition: tokio::sync::Mutex<()>,
    slot: Mutex<Option<Child>>,
    output: tokio::sync::Mutex<Option<mpsc::Receiver<String>>>,
}

impl SupervisedProcess {
    pub fn new(spec: LaunchSpec) -> Self {
        Self {
            spec,
            transition: tokio::sync::Mutex::new(()),
            slot: Mutex::new(None),
            output: tokio::sync::Mutex::new(None),
        }
    }

    pub fn spec(&self) -> &LaunchSpec {
        &self.spec
    }

    /// Launch the server unless a live child already exists.
    pub async fn start(&self) -> Result<StartOutcome, SupervisorError> {
        let _transition = self.transition.lock().await;

        if let ProcessStatus::Running { pid } = self.status() {
            tracing::debug!(?pid, "start requested while server is running");
            return Ok(StartOutcome::AlreadyRunning { pid });
        }

        if !self.spec.script.exists() {
            return Err(SupervisorError::ScriptNotFound {
                path: self.spec.script.clone(),
            });
        }

        let spawn_err = |source: std::io::Error| SupervisorError::Spawn {
            program: self.spec.program.clone(),
            source,
        };

        let mut command = Command::new(&self.spec.program);
        command
            .args(&self.spec.args)
            .arg(&self.spec.script)
            .envs(&self.spec.env)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        let output = attach_output(&mut command).map_err(spawn_err)?;

        let mut child = command.spawn().map_err(spawn_err)?;
        // Close the parent's copies of the write end so EOF follows child exit.
        drop(command);

        let (line_tx, line_rx) = mpsc::channel(OUTPUT_CAPACITY);
        output.pump(&mut child, line_tx);

        let pid = child.id();
        // Publish the stream before the handle so a relay that observes the
        // new child always reads the new child's output.
        *self.output.lock().await = Some(line_rx);
        *self.slot() = Some(child);

        tracing::info!(
            ?pid,
            program = %self.spec.program,
            script = %self.spec.script.display(),
            "print server started"
        );
        Ok(StartOutcome::Started { pid })
    }

    /// Terminate the server: graceful request, bounded wait, then kill.
    ///
    /// The handle is cleared on every path.
    pub async fn stop(&self) -> StopOutcome {
        let _transition = self.transition.lock().await;

        let pid = {
            let mut slot = self.slot();
            let Some(child) = slot.as_mut() else {
                return StopOutcome::NotRunning;
            };
            match child.try_wait() {
                Ok(Some(status)) => {
                    *slot = None;
                    return StopOutcome::AlreadyExited {
                        code: status.code(),
                    };
                }
                Ok(None) => child.id(),
                Err(err) => {
                    tracing::warn!(error = %err, "could not query server status before stop");
                    child.id()
                }
            }
        };

        let outcome = match request_termination(pid) {
            Ok(()) => self.wait_or_kill(pid).await,
            Err(err) => {
                tracing::warn!(?pid, error = %err, "graceful termination unavailable, killing server");
                self.kill(pid).await;
                StopOutcome::Killed
            }
        };

        *self.slot() = None;
        tracing::info!(?pid, ?outcome, "print server stopped");
        outcome
    }

    /// True only while a handle exists and the OS reports it has not exited.
    pub fn is_running(&self) -> bool {
        matches!(self.status(), ProcessStatus::Running { .. })
    }

    pub fn status(&self) -> ProcessStatus {
        let mut slot = self.slot();
        let Some(child) = slot.as_mut() else {
            return ProcessStatus::Absent;
        };
        match child.try_wait() {
            Ok(None) => ProcessStatus::Running { pid: child.id() },
            Ok(Some(status)) => ProcessStatus::Exited {
                code: status.code(),
            },
            Err(err) => {
                tracing::debug!(error = %err, "try_wait failed; treating server as exited");
                ProcessStatus::Exited { code: None }
            }
        }
    }

    pub fn pid(&self) -> Option<u32> {
        match self.status() {
            ProcessStatus::Running { pid } => pid,
            _ => None,
        }
    }

    /// Wait up to `wait` for the next merged output line.
    pub async fn read_line(&self, wait: Duration) -> ReadOutcome {
        let mut output = self.output.lock().await;
        let Some(lines) = output.as_mut() else {
            return ReadOutcome::Closed;
        };
        match tokio::time::timeout(wait, lines.recv()).await {
            Ok(Some(line)) => ReadOutcome::Line(line),
            Ok(None) => {
                *output = None;
                ReadOutcome::Closed
            }
            Err(_) => ReadOutcome::Idle,
        }
    }

    /// Take an already-buffered line without waiting.
    pub async fn try_read_line(&self) -> Option<String> {
        let mut output = self.output.lock().await;
        output.as_mut()?.try_recv().ok()
    }

    async fn wait_or_kill(&self, pid: Option<u32>) -> StopOutcome {
        let deadline = Instant::now() + self.spec.stop_timeout;
        loop {
            if let Some(code) = self.poll_exit() {
                return StopOutcome::Exited { code };
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    ?pid,
                    timeout_ms = self.spec.stop_timeout.as_millis() as u64,
                    "print server ignored termination request, killing"
                );
                self.kill(pid).await;
                return StopOutcome::Killed;
            }
            tokio::time::sleep(EXIT_POLL_INTERVAL).await;
        }
    }

    async fn kill(&self, pid: Option<u32>) {
        kill_group(pid);
        if let Some(child) = self.slot().as_mut() {
            if let Err(err) = child.start_kill() {
                tracing::debug!(error = %err, "kill after group kill failed");
            }
        }

        let deadline = Instant::now() + KILL_REAP_TIMEOUT;
        while Instant::now() < deadline {
            if self.poll_exit().is_some() {
                return;
            }
            tokio::time::sleep(EXIT_POLL_INTERVAL).await;
        }
        // The runtime reaps dropped children in the background.
        tracing::warn!(?pid, "killed server not reaped in time");
    }

    /// `Some(exit code)` once the child has exited.
    fn poll_exit(&self) -> Option<Option<i32>> {
        let mut slot = self.slot();
        match slot.as_mut()?.try_wait() {
            Ok(Some(status)) => Some(status.code()),
            Ok(None) => None,
            Err(_) => Some(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Child>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Forward one output stream line by line; non-UTF-8 bytes are replaced.
async fn pump_lines<R>(stream: R, lines: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                if lines.send(line).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read server output");
                break;
            }
        }
    }
}

/// Where the child's output goes before it is pumped into the line channel.
#[cfg(unix)]
struct MergedOutput(tokio::net::unix::pipe::Receiver);

#[cfg(not(unix))]
struct MergedOutput;

/// Point stdout and stderr at the same pipe so lines keep emission order
/// across both streams.
#[cfg(unix)]
fn attach_output(command: &mut Command) -> std::io::Result<MergedOutput> {
    let (read, write) = nix::unistd::pipe()?;
    // Duplicates carry FD_CLOEXEC; the raw pipe ends do not and close on return.
    let (read, write) = (read.try_clone()?, write.try_clone()?);
    command
        .stdout(Stdio::from(write.try_clone()?))
        .stderr(Stdio::from(write));
    let receiver = tokio::net::unix::pipe::Receiver::from_owned_fd(read)?;
    Ok(MergedOutput(receiver))
}

#[cfg(not(unix))]
fn attach_output(command: &mut Command) -> std::io::Result<MergedOutput> {
    command.stdout(Stdio::piped()).stderr(Stdio::piped());
    Ok(MergedOutput)
}

impl MergedOutput {
    #[cfg(unix)]
    fn pump(self, _child: &mut Child, lines: mpsc::Sender<String>) {
        tokio::spawn(pump_lines(self.0, lines));
    }

    /// Without a shared pipe only per-stream order holds.
    #[cfg(not(unix))]
    fn pump(self, child: &mut Child, lines: mpsc::Sender<String>) {
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_lines(stdout, lines.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_lines(stderr, lines));
        }
    }
}

#[cfg(unix)]
fn request_termination(pid: Option<u32>) -> Result<(), SupervisorError> {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pid = pid.ok_or_else(|| SupervisorError::Signal("server has no pid".to_string()))?;
    match killpg(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(err) => Err(SupervisorError::Signal(err.to_string())),
    }
}

#[cfg(not(unix))]
fn request_termination(_pid: Option<u32>) -> Result<(), SupervisorError> {
    Err(SupervisorError::Signal(
        "graceful termination is not supported on this platform".to_string(),
    ))
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = pid {
        if let Err(err) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            tracing::debug!(pid, error = %err, "group kill failed");
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}
