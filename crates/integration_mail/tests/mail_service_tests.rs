//! Mail service driven through the harness

use std::sync::Arc;

use application::{CallArgs, ErrorMode, Harness, ServiceModule};
use integration_mail::{Folder, MailService};
use serde_json::{Value, json};

fn args(value: Value) -> CallArgs {
    value.as_object().cloned().unwrap_or_default()
}

fn harness(service: &MailService, mode: ErrorMode) -> Harness {
    Harness::builder()
        .service(Arc::new(service.clone()))
        .error_mode(mode)
        .log_reports(false)
        .build()
        .unwrap()
}

#[test]
fn send_email_accepts_single_address_or_list() {
    let service = MailService::new();
    let h = harness(&service, ErrorMode::Raise);

    let sent = h
        .call(
            "mail",
            "send_email",
            &args(json!({ "to": "bob@example.com", "subject": "Hi", "body": "Hello" })),
        )
        .unwrap();
    assert_eq!(sent.value().unwrap()["status"], "sent");

    h.call(
        "mail",
        "send_email",
        &args(json!({ "to": ["bob@example.com", "eve@example.org"], "subject": "Both" })),
    )
    .unwrap();

    let listed = h
        .call("mail", "list_messages", &args(json!({ "folder": "sent" })))
        .unwrap();
    assert_eq!(listed.value().unwrap().as_array().unwrap().len(), 2);
}

#[test]
fn get_message_marks_it_read() {
    let service = MailService::new();
    let id = service.deliver("ana@example.com", "Lunch?", "Noon?");
    let h = harness(&service, ErrorMode::Raise);

    let unread = h
        .call("mail", "list_messages", &args(json!({ "unread_only": true })))
        .unwrap();
    assert_eq!(unread.value().unwrap().as_array().unwrap().len(), 1);

    let message = h
        .call("mail", "get_message", &args(json!({ "message_id": id })))
        .unwrap();
    assert_eq!(message.value().unwrap()["body"], "Noon?");
    assert_eq!(service.snapshot().unread_count(), 0);
}

#[test]
fn invalid_recipient_is_reported_in_structured_mode() {
    let h = harness(&MailService::new(), ErrorMode::Structured);
    let outcome = h
        .call("mail", "send_email", &args(json!({ "to": "nobody", "subject": "x" })))
        .unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.exception_type, "ValueError");
    assert!(report.message.contains("nobody"));
    assert!(report.causes.is_empty());
    assert_eq!(report.traceback[0], r#"File "mail.messages", in send_email"#);
}

#[test]
fn wrong_argument_type_raises_type_error() {
    let h = harness(&MailService::new(), ErrorMode::Raise);
    let err = h
        .call("mail", "send_email", &args(json!({ "to": 42, "subject": "x" })))
        .unwrap_err();
    assert_eq!(err.raised().unwrap().exception_type(), "TypeError");
}

#[test]
fn legacy_inbox_mutation_changes_shape_and_adds_operation() {
    let service = MailService::new();
    service.deliver("ana@example.com", "Lunch?", "");
    service.deliver("bob@example.com", "Report", "");
    let h = harness(&service, ErrorMode::Raise);

    assert!(!h.list_operations("mail").unwrap().iter().any(|op| op.as_str() == "count_unread"));

    h.activate("mail", "legacy_inbox").unwrap();
    let listed = h.call("mail", "list_messages", &CallArgs::new()).unwrap();
    assert_eq!(listed.value().unwrap()[0], json!(["msg-0002", "Report"]));
    let count = h.call("mail", "count_unread", &CallArgs::new()).unwrap();
    assert_eq!(count.value().unwrap(), &json!(2));
    assert!(h.list_operations("mail").unwrap().iter().any(|op| op.as_str() == "count_unread"));

    h.revert("mail").unwrap();
    let listed = h.call("mail", "list_messages", &CallArgs::new()).unwrap();
    assert_eq!(listed.value().unwrap()[0]["subject"], "Report");
}

#[test]
fn state_round_trips_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mail.json");

    let service = MailService::new();
    service.deliver("ana@example.com", "Lunch?", "");
    service.save_state(&path).unwrap();

    let restored = MailService::new();
    restored.load_state(&path).unwrap();
    assert_eq!(restored.snapshot(), service.snapshot());
    assert_eq!(restored.snapshot().list(Folder::Inbox, false).len(), 1);
    assert_eq!(restored.minified_state()["messages"][0]["subject"], "Lunch?");
}
