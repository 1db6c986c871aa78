//! Background relay from the server's merged output to a [`LogSink`].
//!
//! ```text
//!          is_running()            !is_running()
//!   IDLE ───────────────▶ DRAINING ─────────────▶ IDLE
//! ```
//!
//! DRAINING waits at most `drain_backoff` per read; IDLE flushes whatever the
//! exited process left buffered and then polls liveness every `idle_poll`.
//! The stop signal is checked once per iteration and raced against every
//! wait, so shutdown never waits on a quiet server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use printmon_core::{Classifier, LogEntry, LogSink, RelaySettings};

use crate::error::SupervisorError;
use crate::process::{ProcessStatus, ReadOutcome, SupervisedProcess};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayIntervals {
    pub drain_backoff: Duration,
    pub idle_poll: Duration,
}

impl Default for RelayIntervals {
    fn default() -> Self {
        Self::from(&RelaySettings::default())
    }
}

impl From<&RelaySettings> for RelayIntervals {
    fn from(settings: &RelaySettings) -> Self {
        Self {
            drain_backoff: settings.drain_backoff(),
            idle_poll: settings.idle_poll(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Draining,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Lines forwarded to the sink.
    pub lines: usize,
    /// Loop iterations run, including the one that observed the stop signal.
    pub iterations: usize,
}

pub struct Relay {
    process: Arc<SupervisedProcess>,
    sink: Arc<dyn LogSink>,
    classifier: Classifier,
    intervals: RelayIntervals,
}

impl Relay {
    pub fn new(
        process: Arc<SupervisedProcess>,
        sink: Arc<dyn LogSink>,
        classifier: Classifier,
        intervals: RelayIntervals,
    ) -> Self {
        Self {
            process,
            sink,
            classifier,
            intervals,
        }
    }

    /// Run the relay on the current runtime until the handle shuts it down.
    pub fn spawn(self) -> RelayHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let join = tokio::spawn(self.run(shutdown_rx));
        RelayHandle { shutdown_tx, join }
    }

    /// The relay loop. Returns when `shutdown_rx` fires or its sender drops.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> RelayStats {
        let mut state = RelayState::Idle;
        let mut stats = RelayStats::default();

        loop {
            stats.iterations += 1;
            if stop_requested(&mut shutdown_rx) {
                break;
            }

            let next = if self.process.is_running() {
                RelayState::Draining
            } else {
                RelayState::Idle
            };
            if next != state {
                self.on_transition(state, next);
                state = next;
            }

            match state {
                RelayState::Draining => {
                    let outcome = tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        outcome = self.process.read_line(self.intervals.drain_backoff) => outcome,
                    };
                    match outcome {
                        ReadOutcome::Line(line) => self.forward(&line, &mut stats),
                        ReadOutcome::Idle => {}
                        // Streams closed while the process lives on.
                        ReadOutcome::Closed => {
                            if pause(&mut shutdown_rx, self.intervals.drain_backoff).await {
                                break;
                            }
                        }
                    }
                }
                RelayState::Idle => {
                    while let Some(line) = self.process.try_read_line().await {
                        self.forward(&line, &mut stats);
                    }
                    if pause(&mut shutdown_rx, self.intervals.idle_poll).await {
                        break;
                    }
                }
            }
        }

        tracing::debug!(lines = stats.lines, iterations = stats.iterations, "relay stopped");
        stats
    }

    fn forward(&self, line: &str, stats: &mut RelayStats) {
        self.sink.append(LogEntry::classified(line, &self.classifier));
        stats.lines += 1;
    }

    fn on_transition(&self, from: RelayState, to: RelayState) {
        tracing::debug!(?from, ?to, "relay state change");
        if to == RelayState::Idle {
            if let ProcessStatus::Exited { code } = self.process.status() {
                tracing::info!(?code, "print server exited");
            }
        }
    }
}

/// Sleep for `wait`; true if the stop signal arrived first.
async fn pause(shutdown_rx: &mut broadcast::Receiver<()>, wait: Duration) -> bool {
    tokio::select! {
        _ = shutdown_rx.recv() => true,
        _ = tokio::time::sleep(wait) => false,
    }
}

fn stop_requested(shutdown_rx: &mut broadcast::Receiver<()>) -> bool {
    !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty))
}

/// Owner of a running relay task.
pub struct RelayHandle {
    shutdown_tx: broadcast::Sender<()>,
    join: JoinHandle<RelayStats>,
}

impl RelayHandle {
    /// Signal the relay to stop and wait for it to finish.
    pub async fn shutdown(self) -> Result<RelayStats, SupervisorError> {
        let _ = self.shutdown_tx.send(());
        self.join.await.map_err(|err| SupervisorError::Join {
            task: "relay",
            message: err.to_string(),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
