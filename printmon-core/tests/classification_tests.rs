//! Severity and summary rule tests for `printmon-core`.

use printmon_core::{Classifier, LogEntry, Rule, RuleSet, Severity, SummaryKind, SummaryRules};
use rstest::rstest;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[rstest]
#[case("ERROR: printer offline", Severity::Error)]
#[case("Traceback (most recent call last):", Severity::Error)]
#[case("  File \"printer_app.py\", line 3, ERROR in handler", Severity::Error)]
#[case("Server ready on port 5000", Severity::Info)]
#[case(" * Running on http://127.0.0.1:5000", Severity::Info)]
#[case("error: lowercase is not a marker", Severity::Info)]
#[case("traceback in lowercase", Severity::Info)]
#[case("WARNING: low paper", Severity::Info)]
fn default_classifier(#[case] line: &str, #[case] expected: Severity) {
    assert_eq!(Classifier::default().classify(line), expected);
}

#[test]
fn classified_entry_keeps_text_and_severity() {
    let entry = LogEntry::classified("ERROR: printer offline\n", &Classifier::default());
    assert_eq!(entry.severity, Severity::Error);
    assert_eq!(entry.message, "ERROR: printer offline");
}

#[test]
fn custom_rules_are_ordered() {
    let classifier = Classifier::new(
        RuleSet::new(vec![
            Rule::new("recovered", Severity::Info),
            Rule::new("ERROR", Severity::Error),
        ]),
        Severity::Info,
    );
    assert_eq!(classifier.classify("ERROR recovered"), Severity::Info);
    assert_eq!(classifier.classify("ERROR fatal"), Severity::Error);
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[rstest]
#[case("Server started successfully!", SummaryKind::Success, "Print server is up")]
#[case(" * Running on http://127.0.0.1:5000", SummaryKind::Success, "Print server is listening")]
#[case("Response: 200 Imprimindo", SummaryKind::Success, "Print request accepted")]
#[case(
    "Failed to call http://localhost:5000/imprimir: Connection refused",
    SummaryKind::Failure,
    "Print server is unreachable"
)]
#[case("Traceback (most recent call last):", SummaryKind::Failure, "Print server crashed")]
#[case(
    "printer_app.py not found in the current directory.",
    SummaryKind::Failure,
    "Server script is missing"
)]
fn default_summaries(#[case] line: &str, #[case] kind: SummaryKind, #[case] text: &str) {
    let summaries = SummaryRules::default().summarize(line);
    assert_eq!(summaries.len(), 1, "unexpected summaries: {summaries:?}");
    assert_eq!(summaries[0].kind, kind);
    assert_eq!(summaries[0].text, text);
}

#[test]
fn unmatched_line_has_no_summary() {
    assert!(SummaryRules::default()
        .summarize("GET /imprimir HTTP/1.1 200")
        .is_empty());
}

#[test]
fn http_not_found_body_is_not_a_missing_script() {
    let summaries = SummaryRules::default().summarize(
        "Response: 404 The requested URL was not found on the server.",
    );
    assert!(summaries.is_empty(), "unexpected summaries: {summaries:?}");
}

#[test]
fn one_summary_per_kind() {
    let rules = SummaryRules {
        success: RuleSet::new(vec![
            Rule::new("ok", "first".to_string()),
            Rule::new("ok", "second".to_string()),
        ]),
        failure: RuleSet::new(vec![Rule::new("but", "partial".to_string())]),
    };
    let summaries = rules.summarize("ok but slow");
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].kind, SummaryKind::Success);
    assert_eq!(summaries[0].text, "first");
    assert_eq!(summaries[1].kind, SummaryKind::Failure);
}
