//! Terminal rendering of the operator log.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use printmon_core::{LogEntry, LogSink, Severity, Summary, SummaryKind, SummaryRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `[HH:MM:SS] LEVEL message` with a coloured badge.
    Text,
    /// One JSON object per line.
    Json,
}

/// Full log, or only the lines a summary rule recognises.
#[derive(Debug, Clone)]
pub enum View {
    Full,
    Simple(SummaryRules),
}

/// Writes entries to stdout, one whole line per append.
pub struct ConsoleSink {
    format: OutputFormat,
    view: View,
    write_lock: Mutex<()>,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    timestamp: String,
    kind: SummaryKind,
    summary: &'a str,
}

impl ConsoleSink {
    pub fn new(format: OutputFormat, view: View) -> Self {
        Self {
            format,
            view,
            write_lock: Mutex::new(()),
        }
    }

    fn render(&self, entry: &LogEntry) -> Vec<String> {
        match &self.view {
            View::Full => vec![self.render_entry(entry)],
            View::Simple(rules) => rules
                .summarize(&entry.message)
                .iter()
                .map(|summary| self.render_summary(entry, summary))
                .collect(),
        }
    }

    fn render_entry(&self, entry: &LogEntry) -> String {
        match self.format {
            OutputFormat::Text => format!(
                "[{}] {} {}",
                entry.timestamp.format("%H:%M:%S"),
                badge(entry.severity),
                entry.message
            ),
            OutputFormat::Json => serde_json::to_string(entry)
                .unwrap_or_else(|err| format!(r#"{{"error":"unserializable entry: {err}"}}"#)),
        }
    }

    fn render_summary(&self, entry: &LogEntry, summary: &Summary) -> String {
        match self.format {
            OutputFormat::Text => {
                let mark = match summary.kind {
                    SummaryKind::Success => "✓".green().bold(),
                    SummaryKind::Failure => "✗".red().bold(),
                };
                format!(
                    "[{}] {} {}",
                    entry.timestamp.format("%H:%M:%S"),
                    mark,
                    summary.text
                )
            }
            OutputFormat::Json => serde_json::to_string(&SummaryLine {
                timestamp: entry.timestamp.to_rfc3339(),
                kind: summary.kind,
                summary: &summary.text,
            })
            .unwrap_or_else(|err| format!(r#"{{"error":"unserializable summary: {err}"}}"#)),
        }
    }
}

impl LogSink for ConsoleSink {
    fn append(&self, entry: LogEntry) {
        let lines = self.render(&entry);
        if lines.is_empty() {
            return;
        }
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for line in lines {
            // A closed stdout must not take the supervisor down.
            let _ = writeln!(out, "{line}");
        }
        let _ = out.flush();
    }
}

fn badge(severity: Severity) -> colored::ColoredString {
    let label = format!(" {severity:<5} ");
    match severity {
        Severity::Info => label.white().on_blue().bold(),
        Severity::Error => label.white().on_red().bold(),
    }
}
