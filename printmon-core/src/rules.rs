//! Ordered substring rules over log text.
//!
//! Both the severity heuristic and the simplified "summary" view are plain
//! data: a list of `(pattern, value)` pairs evaluated top-to-bottom, first
//! substring match wins. Matching is case-sensitive.

use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// One `(pattern, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule<T> {
    pub pattern: String,
    #[serde(alias = "summary", alias = "severity")]
    pub value: T,
}

impl<T> Rule<T> {
    pub fn new(pattern: impl Into<String>, value: T) -> Self {
        Self {
            pattern: pattern.into(),
            value,
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        line.contains(self.pattern.as_str())
    }
}

/// An ordered rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet<T> {
    rules: Vec<Rule<T>>,
}

impl<T> Default for RuleSet<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T> RuleSet<T> {
    pub fn new(rules: Vec<Rule<T>>) -> Self {
        Self { rules }
    }

    pub fn first_match(&self, line: &str) -> Option<&T> {
        self.rules
            .iter()
            .find(|rule| rule.matches(line))
            .map(|rule| &rule.value)
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<T> FromIterator<(&'static str, T)> for RuleSet<T> {
    fn from_iter<I: IntoIterator<Item = (&'static str, T)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(p, v)| Rule::new(p, v)).collect())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Derives [`Severity`] from raw server output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    rules: RuleSet<Severity>,
    fallback: Severity,
}

impl Default for Classifier {
    /// `ERROR` or `Traceback` anywhere in the line means [`Severity::Error`].
    fn default() -> Self {
        Self {
            rules: [("ERROR", Severity::Error), ("Traceback", Severity::Error)]
                .into_iter()
                .collect(),
            fallback: Severity::Info,
        }
    }
}

impl Classifier {
    pub fn new(rules: RuleSet<Severity>, fallback: Severity) -> Self {
        Self { rules, fallback }
    }

    pub fn classify(&self, line: &str) -> Severity {
        self.rules
            .first_match(line)
            .copied()
            .unwrap_or(self.fallback)
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    Success,
    Failure,
}

/// A user-facing one-liner distilled from a noisy log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub kind: SummaryKind,
    pub text: String,
}

/// Success and failure rule lists for the simplified view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRules {
    #[serde(default)]
    pub success: RuleSet<String>,
    #[serde(default)]
    pub failure: RuleSet<String>,
}

impl Default for SummaryRules {
    fn default() -> Self {
        Self {
            success: [
                ("Server started successfully", "Print server is up".to_string()),
                ("server started successfully", "Print server is up".to_string()),
                ("Running on http", "Print server is listening".to_string()),
                ("Server stopped.", "Print server stopped".to_string()),
                ("Response: 2", "Print request accepted".to_string()),
            ]
            .into_iter()
            .collect(),
            failure: [
                ("Connection refused", "Print server is unreachable".to_string()),
                ("connection refused", "Print server is unreachable".to_string()),
                ("Failed to call", "Print request failed".to_string()),
                ("Traceback", "Print server crashed".to_string()),
                (
                    "not found in the current directory",
                    "Server script is missing".to_string(),
                ),
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl SummaryRules {
    /// At most one summary per kind, success first.
    pub fn summarize(&self, line: &str) -> Vec<Summary> {
        let success = self.success.first_match(line).map(|text| Summary {
            kind: SummaryKind::Success,
            text: text.clone(),
        });
        let failure = self.failure.first_match(line).map(|text| Summary {
            kind: SummaryKind::Failure,
            text: text.clone(),
        });
        success.into_iter().chain(failure).collect()
    }
}
