//! printmon core library — domain types, text rule sets, settings, errors.
//!
//! Public API surface:
//! - [`types`] — severities, log entries, print parameters, endpoints
//! - [`rules`] — ordered substring rules for severity and summaries
//! - [`config`] — YAML settings with discovery
//! - [`sink`] — [`LogSink`] and an in-memory sink
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod rules;
pub mod sink;
pub mod types;

pub use config::{
    ClientSettings, FormSettings, RelaySettings, ServerSettings, Settings, SummarySettings,
};
pub use error::ConfigError;
pub use rules::{Classifier, Rule, RuleSet, Summary, SummaryKind, SummaryRules};
pub use sink::{LogSink, MemorySink};
pub use types::{Endpoint, FormField, LogEntry, PrintParams, Severity};
