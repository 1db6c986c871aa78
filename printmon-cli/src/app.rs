//! Operator actions shared by the console and `run`.
//!
//! Every action reports through the same sink the relay writes to; nothing
//! here returns an error to the caller.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use printmon_client::{CallOutcome, PrintClient};
use printmon_core::{Classifier, Endpoint, FormField, LogSink, PrintParams, Settings};
use printmon_supervisor::{
    LaunchSpec, ProcessStatus, Relay, RelayHandle, RelayIntervals, StartOutcome, StopOutcome,
    SupervisedProcess, SupervisorError,
};

use crate::output::{ConsoleSink, View};
use crate::GlobalArgs;

pub struct App {
    settings: Settings,
    process: Arc<SupervisedProcess>,
    client: PrintClient,
    sink: Arc<dyn LogSink>,
    form: PrintParams,
}

impl App {
    pub fn new(settings: Settings, cwd: &Path, sink: Arc<dyn LogSink>) -> Self {
        let process = Arc::new(SupervisedProcess::new(LaunchSpec::from_settings(
            &settings.server,
            cwd,
        )));
        let client = PrintClient::new(&settings.client);
        let form = settings.form.to_params();
        Self {
            settings,
            process,
            client,
            sink,
            form,
        }
    }

    /// Load settings per `global` and render to the terminal.
    pub fn from_args(global: &GlobalArgs) -> Result<Self> {
        let (settings, source) =
            Settings::discover(global.config.as_deref()).context("failed to load settings")?;
        if let Some(source) = source {
            tracing::debug!(path = %source.display(), "settings loaded");
        }
        let view = if global.simple {
            View::Simple(settings.summaries.clone())
        } else {
            View::Full
        };
        let sink: Arc<dyn LogSink> = Arc::new(ConsoleSink::new(global.format, view));
        let cwd = std::env::current_dir().context("could not determine working directory")?;
        Ok(Self::new(settings, &cwd, sink))
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    pub fn form(&self) -> &PrintParams {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PrintParams {
        &mut self.form
    }

    pub fn client(&self) -> &PrintClient {
        &self.client
    }

    pub fn set_field(&mut self, field: FormField, value: &str) {
        self.form.set(field, value);
        self.sink.info(&format!("{field} = {value}"));
    }

    pub fn spawn_relay(&self) -> RelayHandle {
        Relay::new(
            self.process.clone(),
            self.sink.clone(),
            Classifier::default(),
            RelayIntervals::from(&self.settings.relay),
        )
        .spawn()
    }

    pub fn banner(&self) {
        self.sink.info("=== Print ticket client ===");
        self.sink
            .info("Console ready. Type 'help' for commands; 'start' launches the server.");
    }

    pub async fn handle_start(&self) -> bool {
        self.sink.info("Starting server...");
        match self.process.start().await {
            Ok(StartOutcome::Started { .. }) => {
                self.sink.info("Server started successfully!");
                true
            }
            Ok(StartOutcome::AlreadyRunning { pid }) => {
                self.sink
                    .info(&format!("Server is already running{}.", pid_suffix(pid)));
                true
            }
            Err(SupervisorError::ScriptNotFound { path }) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.sink
                    .error(&format!("{name} not found in the current directory."));
                false
            }
            Err(err) => {
                self.sink.error(&format!("Failed to start server: {err}"));
                false
            }
        }
    }

    pub async fn handle_stop(&self) {
        self.sink.info("Stopping server...");
        match self.process.stop().await {
            StopOutcome::NotRunning => self.sink.info("Server was not running."),
            StopOutcome::AlreadyExited { code } => self
                .sink
                .info(&format!("Server had already exited{}.", code_suffix(code))),
            StopOutcome::Exited { .. } => self.sink.info("Server stopped."),
            StopOutcome::Killed => {
                self.sink.info(&format!(
                    "Server did not exit within {}s and was killed.",
                    self.settings.server.stop_timeout_secs
                ));
                self.sink.info("Server stopped.");
            }
        }
    }

    /// Stop the server on the way out, quietly when nothing is running.
    pub async fn shutdown(&self) {
        if self.process.status() != ProcessStatus::Absent {
            self.handle_stop().await;
        }
    }

    /// Resolve once the server is no longer running, after the relay has had
    /// time to flush its last lines. Logs the exit as an error.
    pub async fn wait_for_exit(&self) -> ProcessStatus {
        let poll = self.settings.relay.idle_poll();
        let status = loop {
            let status = self.process.status();
            if !matches!(status, ProcessStatus::Running { .. }) {
                break status;
            }
            tokio::time::sleep(poll).await;
        };

        tokio::time::sleep(poll * 2).await;
        let detail = match status {
            ProcessStatus::Exited { code } => code_suffix(code),
            _ => String::new(),
        };
        self.sink.error(&format!("Server exited unexpectedly{detail}."));
        status
    }

    pub fn handle_status(&self) {
        let text = match self.process.status() {
            ProcessStatus::Absent => "stopped".to_string(),
            ProcessStatus::Running { pid } => format!("running{}", pid_suffix(pid)),
            ProcessStatus::Exited { code } => format!("exited{}", code_suffix(code)),
        };
        self.sink.info(&format!("Server status: {text}"));
    }

    /// Run one test call off the async runtime; the outcome is already logged.
    pub async fn handle_test(&self, endpoint: Endpoint) -> CallOutcome {
        let client = self.client.clone();
        let params = self.form.clone();
        let sink = self.sink.clone();
        let url = client.url_for(endpoint);
        match tokio::task::spawn_blocking(move || client.invoke(endpoint, &params, sink.as_ref()))
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                let outcome = CallOutcome::Failed {
                    url,
                    cause: format!("call task failed: {err}"),
                };
                self.sink.append(outcome.to_entry());
                outcome
            }
        }
    }
}

fn pid_suffix(pid: Option<u32>) -> String {
    pid.map(|pid| format!(" (pid {pid})")).unwrap_or_default()
}

fn code_suffix(code: Option<i32>) -> String {
    match code {
        Some(code) => format!(" with code {code}"),
        None => " (terminated by signal)".to_string(),
    }
}
