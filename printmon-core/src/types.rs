//! Domain types shared by the supervisor, the HTTP invoker and the CLI.
//!
//! Nothing here is persisted; log entries live only as long as the sink
//! that consumes them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::rules::Classifier;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Two-valued classification of an operator log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.pad("INFO"),
            Severity::Error => f.pad("ERROR"),
        }
    }
}

/// The two test endpoints exposed by the print-ticket server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Print,
    QrCode,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Print => "/imprimir",
            Endpoint::QrCode => "/imprimir/qrcode",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Operator-editable form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Header,
    Footer,
    Code,
    Services,
    CreatedDate,
    QrCode,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::Header,
        FormField::Footer,
        FormField::Code,
        FormField::Services,
        FormField::CreatedDate,
        FormField::QrCode,
    ];

    /// Query-string key for this field.
    pub fn key(self) -> &'static str {
        match self {
            FormField::Header => "header",
            FormField::Footer => "footer",
            FormField::Code => "code",
            FormField::Services => "services",
            FormField::CreatedDate => "created_date",
            FormField::QrCode => "qrcode",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| {
                format!(
                    "unknown field '{s}'; expected: header, footer, code, services, created_date, qrcode"
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One line shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            timestamp: Local::now(),
            severity,
            message: message.trim_end_matches(['\r', '\n']).to_string(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Build an entry for a raw server output line, severity derived from its text.
    pub fn classified(line: &str, classifier: &Classifier) -> Self {
        Self::new(classifier.classify(line), line)
    }
}

/// Query parameters for a test print, read from the form at call time.
///
/// Values are passed through untouched; the print server decides what is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PrintParams {
    pub header: String,
    pub footer: String,
    pub code: String,
    pub services: String,
    pub created_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qrcode: Option<String>,
}

impl PrintParams {
    /// Query pairs in the order the server receives them.
    ///
    /// The QR endpoint always carries `qrcode`, empty when no payload is set.
    pub fn query_pairs(&self, endpoint: Endpoint) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("created_date", self.created_date.as_str()),
            ("code", self.code.as_str()),
            ("services", self.services.as_str()),
            ("header", self.header.as_str()),
            ("footer", self.footer.as_str()),
        ];
        if endpoint == Endpoint::QrCode {
            pairs.push(("qrcode", self.qrcode.as_deref().unwrap_or("")));
        }
        pairs
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Header => &self.header,
            FormField::Footer => &self.footer,
            FormField::Code => &self.code,
            FormField::Services => &self.services,
            FormField::CreatedDate => &self.created_date,
            FormField::QrCode => self.qrcode.as_deref().unwrap_or(""),
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Header => self.header = value,
            FormField::Footer => self.footer = value,
            FormField::Code => self.code = value,
            FormField::Services => self.services = value,
            FormField::CreatedDate => self.created_date = value,
            FormField::QrCode => {
                self.qrcode = if value.is_empty() { None } else { Some(value) };
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
