//! End-to-end fault injection through a bootstrapped harness

#![allow(clippy::panic)] // Allow panic! in tests for clear failure messages

use std::fs;
use std::path::Path;

use application::{CallArgs, CallError, ErrorMode, Harness};
use infrastructure::{AppConfig, FaultInjectionAppConfig, ServiceFaultConfig, build_harness};
use proptest::prelude::*;
use serde_json::{Value, json};

fn args(value: Value) -> CallArgs {
    value.as_object().cloned().unwrap_or_default()
}

fn write_config(root: &Path, service: &str, rules: &str, kinds: &str) {
    let dir = root.join(service);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("error_rules.json"), rules).unwrap();
    fs::write(dir.join("error_kinds.json"), kinds).unwrap();
}

fn config(root: &Path) -> AppConfig {
    AppConfig {
        fault_injection: FaultInjectionAppConfig {
            config_root: root.to_path_buf(),
            seed: Some(11),
            ..FaultInjectionAppConfig::default()
        },
        ..AppConfig::default()
    }
}

fn harness(config: &AppConfig, mode: ErrorMode) -> Harness {
    let mut config = config.clone();
    config.error_reporting.mode = Some(mode);
    config.error_reporting.log_reports = false;
    build_harness(&config).unwrap()
}

fn raised_type(result: Result<application::CallOutcome, CallError>) -> Option<String> {
    match result {
        Ok(_) => None,
        Err(CallError::Raised(err)) => Some(err.exception_type().to_string()),
        Err(CallError::Resolution(err)) => panic!("unexpected resolution error: {err}"),
    }
}

const NTH_LIST: &str = r#"[{ "operation": "list_messages", "trigger": { "kind": "nth_call", "n": 3 },
    "error_kind": "flaky" }]"#;
const FLAKY: &str = r#"{ "flaky": "TimeoutError" }"#;

#[test]
fn predicate_rule_blocks_one_recipient() {
    let root = tempfile::tempdir().unwrap();
    write_config(
        root.path(),
        "mail",
        r#"[{ "operation": "send_email", "trigger": { "kind": "predicate", "argument": "to",
             "condition": { "equals": "blocked@example.com" } },
             "error_kind": "bounce", "message": "{service} cannot reach {to}" }]"#,
        r#"{ "bounce": { "exception": "ConnectionError" } }"#,
    );
    let h = harness(&config(root.path()), ErrorMode::Raise);

    let ok = h.call(
        "mail",
        "send_email",
        &args(json!({ "to": "ok@example.com", "subject": "a" })),
    );
    assert!(ok.is_ok());

    let err = h
        .call(
            "mail",
            "send_email",
            &args(json!({ "to": "blocked@example.com", "subject": "b" })),
        )
        .unwrap_err();
    let raised = err.raised().unwrap();
    assert_eq!(raised.exception_type(), "ConnectionError");
    assert_eq!(raised.message(), "mail cannot reach blocked@example.com");
    assert_eq!(raised.frames()[0].module, "fault_injection");
    assert_eq!(raised.frames()[0].function, "send_email");
}

#[test]
fn structured_mode_reports_injected_fault() {
    let root = tempfile::tempdir().unwrap();
    write_config(
        root.path(),
        "calendar",
        r#"[{ "operation": "list_events", "trigger": { "kind": "always" }, "error_kind": "down" }]"#,
        r#"{ "down": "ConnectionError" }"#,
    );
    let h = harness(&config(root.path()), ErrorMode::Structured);

    let outcome = h.call("calendar", "list_events", &CallArgs::new()).unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.exception_type, "ConnectionError");
    assert_eq!(report.message, "Simulated down failure in calendar.list_events");
    assert_eq!(report.module, "calendar");
    assert_eq!(report.function, "list_events");
    assert_eq!(
        report.traceback,
        vec![
            r#"File "fault_injection", in list_events"#.to_string(),
            "ConnectionError: Simulated down failure in calendar.list_events".to_string(),
        ]
    );
}

#[test]
fn nth_call_counter_spans_mutations_and_survives_revert() {
    let root = tempfile::tempdir().unwrap();
    write_config(root.path(), "mail", NTH_LIST, FLAKY);
    let h = harness(&config(root.path()), ErrorMode::Raise);

    assert_eq!(raised_type(h.call("mail", "list_messages", &CallArgs::new())), None);
    h.activate("mail", "legacy_inbox").unwrap();
    assert_eq!(raised_type(h.call("mail", "list_messages", &CallArgs::new())), None);
    h.revert("mail").unwrap();
    assert_eq!(
        raised_type(h.call("mail", "list_messages", &CallArgs::new())).as_deref(),
        Some("TimeoutError")
    );
    assert_eq!(raised_type(h.call("mail", "list_messages", &CallArgs::new())), None);

    h.reset_faults();
    let stats = h.fault_stats("mail").unwrap();
    assert_eq!(stats.total_calls, 0);
    assert_eq!(raised_type(h.call("mail", "list_messages", &CallArgs::new())), None);
    assert_eq!(raised_type(h.call("mail", "list_messages", &CallArgs::new())), None);
    assert_eq!(
        raised_type(h.call("mail", "list_messages", &CallArgs::new())).as_deref(),
        Some("TimeoutError")
    );
}

#[test]
fn handles_share_the_counter_of_the_service() {
    let root = tempfile::tempdir().unwrap();
    write_config(root.path(), "mail", NTH_LIST, FLAKY);
    let h = harness(&config(root.path()), ErrorMode::Raise);

    let first = h.get_operation("mail", "list_messages").unwrap();
    let second = h.get_operation("mail", "list_messages").unwrap();
    assert!(first.call(&CallArgs::new()).is_ok());
    assert!(second.call(&CallArgs::new()).is_ok());
    assert!(first.call(&CallArgs::new()).is_err());
}

#[test]
fn same_seed_replays_same_faults() {
    let root = tempfile::tempdir().unwrap();
    write_config(
        root.path(),
        "calendar",
        r#"[{ "operation": "list_events", "trigger": { "kind": "probability", "probability": 0.5 },
             "error_kind": "flaky" }]"#,
        FLAKY,
    );
    let cfg = config(root.path());

    let run = |h: &Harness| -> Vec<bool> {
        (0..40)
            .map(|_| h.call("calendar", "list_events", &CallArgs::new()).is_err())
            .collect()
    };
    let first = run(&harness(&cfg, ErrorMode::Raise));
    let second = run(&harness(&cfg, ErrorMode::Raise));
    assert_eq!(first, second);
    assert!(first.iter().any(|&failed| failed));
    assert!(first.iter().any(|&failed| !failed));
}

#[test]
fn run_budget_caps_injected_faults() {
    let root = tempfile::tempdir().unwrap();
    write_config(
        root.path(),
        "calendar",
        r#"[{ "operation": "list_events", "trigger": { "kind": "always" }, "error_kind": "down" }]"#,
        r#"{ "down": "ConnectionError" }"#,
    );
    let mut cfg = config(root.path());
    cfg.fault_injection.max_errors_per_run = Some(2);
    let h = harness(&cfg, ErrorMode::Raise);

    let failures = (0..5)
        .filter(|_| h.call("calendar", "list_events", &CallArgs::new()).is_err())
        .count();
    assert_eq!(failures, 2);

    let stats = h.fault_stats("calendar").unwrap();
    assert_eq!(stats.faults_injected, 2);
    assert_eq!(stats.total_calls, 5);
    assert_eq!(stats.max_errors_per_run, Some(2));
}

#[test]
fn disabled_service_passes_through() {
    let root = tempfile::tempdir().unwrap();
    write_config(
        root.path(),
        "calendar",
        r#"[{ "operation": "list_events", "trigger": { "kind": "always" }, "error_kind": "down" }]"#,
        r#"{ "down": "ConnectionError" }"#,
    );
    let mut cfg = config(root.path());
    cfg.fault_injection.services.insert(
        "calendar".into(),
        ServiceFaultConfig {
            enabled: Some(false),
            ..ServiceFaultConfig::default()
        },
    );
    let h = harness(&cfg, ErrorMode::Raise);

    assert!(h.call("calendar", "list_events", &CallArgs::new()).is_ok());
    assert!(!h.fault_stats("calendar").unwrap().enabled);
}

#[test]
fn malformed_rules_fail_on_first_use() {
    let root = tempfile::tempdir().unwrap();
    write_config(
        root.path(),
        "mail",
        r#"[{ "operation": "send_email", "trigger": { "kind": "sometimes" }, "error_kind": "x" }]"#,
        r#"{ "x": "ValueError" }"#,
    );
    let h = harness(&config(root.path()), ErrorMode::Structured);

    let err = h.call("mail", "list_messages", &CallArgs::new()).unwrap_err();
    match err {
        CallError::Resolution(err) => assert!(err.is_configuration_error()),
        CallError::Raised(err) => panic!("unexpected raise: {err}"),
    }
    assert!(h.call("calendar", "list_events", &CallArgs::new()).is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn nth_call_fires_exactly_once(n in 1u64..8, extra in 0u64..8) {
        let root = tempfile::tempdir().unwrap();
        let rules = format!(
            r#"[{{ "operation": "list_messages", "trigger": {{ "kind": "nth_call", "n": {n} }},
                 "error_kind": "flaky" }}]"#
        );
        write_config(root.path(), "mail", &rules, FLAKY);
        let h = harness(&config(root.path()), ErrorMode::Raise);

        let failures: Vec<u64> = (1..=n + extra)
            .filter(|_| h.call("mail", "list_messages", &CallArgs::new()).is_err())
            .collect();
        prop_assert_eq!(failures, vec![n]);
    }
}
