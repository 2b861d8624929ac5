//! End-to-end pass over a synthetic application form: fuzzy pass, snapshot,
//! AI action batch, finalized ledger.

use formfill::form::builder::FormBuilder;
use formfill::form::FieldEvent;
use formfill::ledger::FilledBy;
use formfill::record::DataRecord;
use formfill::session::AutofillSession;
use formfill::{AutofillError, FormTree};
use serde_json::json;
use std::collections::BTreeSet;

fn labelled_input(b: &mut FormBuilder, id: &str, label: &str, input_type: &str) {
    b.open("label");
    b.attr("for", id);
    b.text(label);
    b.close();
    b.open("input");
    b.attr("type", input_type);
    b.attr("id", id);
    b.close();
}

/// A job-application form with sections, a select, a checkbox and an
/// upload control.
fn application_form() -> FormTree {
    let mut b = FormBuilder::new("https://jobs.example.test/apply", "Application");

    b.open("h2");
    b.text("Personal Information");
    b.close();
    labelled_input(&mut b, "first-name", "First Name", "text");
    labelled_input(&mut b, "last-name", "Last Name", "text");
    labelled_input(&mut b, "email", "Email Address", "text");
    labelled_input(&mut b, "phone", "Phone", "text");

    b.open("h2");
    b.text("Details");
    b.close();
    b.open("label");
    b.attr("for", "country");
    b.text("Country");
    b.close();
    b.open("select");
    b.attr("id", "country");
    b.option("", "Choose...", false);
    b.option("us", "United States", false);
    b.option("gb", "United Kingdom", false);
    b.close();
    labelled_input(&mut b, "newsletter", "Newsletter", "checkbox");
    labelled_input(&mut b, "summary", "Professional Summary", "text");

    b.open("div");
    b.text("Upload your resume or CV");
    b.open("input");
    b.attr("type", "file");
    b.attr("id", "resume-upload");
    b.close();
    b.close();

    b.finish()
}

fn applicant() -> DataRecord {
    DataRecord::new(json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.test",
        "phone_number": "555-0100",
        "country": "United Kingdom",
        "newsletter": "yes",
        "resume": "ada_lovelace_cv.pdf"
    }))
}

#[test]
fn fuzzy_pass_fills_the_form() {
    let mut session = AutofillSession::new(application_form());
    let report = session.run_fuzzy_pass(&applicant());

    assert!(report.success);
    let tree = session.tree();
    let value_of = |sel: &str| tree.value(tree.resolve_selector(sel).unwrap()).to_string();

    assert_eq!(value_of("#first-name"), "Ada");
    assert_eq!(value_of("#last-name"), "Lovelace");
    assert_eq!(value_of("#email"), "ada@example.test");
    assert_eq!(value_of("#phone"), "555-0100");
    assert_eq!(value_of("#country"), "gb");
    assert!(tree.checked(tree.resolve_selector("#newsletter").unwrap()));

    let upload = tree.resolve_selector("#resume-upload").unwrap();
    assert_eq!(tree.files(upload)[0].name, "ada_lovelace_cv.pdf");
}

#[test]
fn text_fill_dispatches_full_event_burst() {
    let mut session = AutofillSession::new(application_form());
    session.run_fuzzy_pass(&applicant());

    let tree = session.tree();
    let node = tree.resolve_selector("#first-name").unwrap();
    assert_eq!(
        tree.events_for(node),
        vec![FieldEvent::Input, FieldEvent::Change, FieldEvent::Blur, FieldEvent::KeyUp]
    );
}

#[test]
fn checkbox_dispatches_change_then_click() {
    let mut session = AutofillSession::new(application_form());
    session.run_fuzzy_pass(&applicant());

    let tree = session.tree();
    let node = tree.resolve_selector("#newsletter").unwrap();
    assert_eq!(tree.events_for(node), vec![FieldEvent::Change, FieldEvent::Click]);
}

#[test]
fn rerun_commits_nothing() {
    let mut session = AutofillSession::new(application_form());
    let first = session.run_fuzzy_pass(&applicant());
    let second = session.run_fuzzy_pass(&applicant());

    assert!(first.filled_count > 0);
    assert_eq!(second.filled_count, 0);
}

#[test]
fn snapshot_reflects_sections_and_filled_state() {
    let mut session = AutofillSession::new(application_form());
    session.run_fuzzy_pass(&DataRecord::new(json!({"first_name": "Ada"})));

    let snap = session.capture_snapshot();
    let headings: Vec<&str> = snap.sections.iter().map(|s| s.heading.as_str()).collect();
    assert!(headings.contains(&"Personal Information"));
    assert!(headings.contains(&"Details"));

    let first = snap.all_fields.iter().find(|f| f.selector == "#first-name").unwrap();
    assert_eq!(first.filled_by.as_deref(), Some("fuzzy_matching"));
    assert!(!first.should_fill);

    let email = snap.all_fields.iter().find(|f| f.selector == "#email").unwrap();
    assert!(email.should_fill);
    assert!(email.labels.is_some());
}

#[test]
fn action_batch_completes_what_fuzzy_missed() {
    let mut session = AutofillSession::new(application_form());
    session.run_fuzzy_pass(&DataRecord::new(json!({"first_name": "Ada"})));

    let payload = r##"{"actions": [
        {"selector": "#email", "action": "fill", "value": "ada@example.test",
         "reasoning": "matches the email field"},
        {"selector": "#country", "action": "select", "value": "United States"},
        {"selector": "#summary", "action": "fill", "value": "null"},
        {"selector": "#vanished", "action": "fill", "value": "x"}
    ]}"##;
    let report = session.execute_actions(payload).unwrap();

    assert_eq!(report.success, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(report.errors.len(), 1);

    let tree = session.tree();
    assert_eq!(tree.value(tree.resolve_selector("#email").unwrap()), "ada@example.test");
    assert_eq!(tree.value(tree.resolve_selector("#country").unwrap()), "us");
    // The placeholder "null" instruction never touched the control.
    assert_eq!(tree.value(tree.resolve_selector("#summary").unwrap()), "");

    let entries = session.ledger();
    let email = entries.iter().find(|e| e.selector == "#email").unwrap();
    assert_eq!(email.filled_by, Some(FilledBy::AiAutofill));
    let first = entries.iter().find(|e| e.selector == "#first-name").unwrap();
    assert_eq!(first.filled_by, Some(FilledBy::FuzzyMatch));
    let summary = entries.iter().find(|e| e.selector == "#summary").unwrap();
    assert_eq!(summary.filled_by, Some(FilledBy::Failed));
}

#[test]
fn malformed_batch_leaves_everything_untouched() {
    let mut session = AutofillSession::new(application_form());
    session.run_fuzzy_pass(&applicant());
    let before = session.ledger().len();

    let err = session.execute_actions("not json at all").unwrap_err();
    assert!(matches!(err, AutofillError::MalformedBatch { .. }));
    assert_eq!(session.ledger().len(), before);
}

#[test]
fn ledger_selectors_are_unique() {
    let mut session = AutofillSession::new(application_form());
    session.run_fuzzy_pass(&applicant());
    session
        .execute_actions(r##"{"actions": [{"selector": "#summary", "action": "fill", "value": "Engineer"}]}"##)
        .unwrap();

    let entries = session.ledger();
    let selectors: BTreeSet<&str> = entries.iter().map(|e| e.selector.as_str()).collect();
    assert_eq!(selectors.len(), entries.len());
}

#[test]
fn summary_counts_add_up() {
    let mut session = AutofillSession::new(application_form());
    session.run_fuzzy_pass(&DataRecord::new(json!({"first_name": "Ada"})));

    let summary = session.ledger_summary();
    assert!(summary.filled >= 1);
    assert!(summary.failed >= 1);
    assert_eq!(summary.total, session.ledger().len());
}
