use sana_consult::channel::fault::{normalize, FALLBACK_MESSAGE};
use serde_json::json;

#[test]
fn direct_message_field() {
    let fault = normalize(&json!({ "message": "Microphone permission denied" }));
    assert_eq!(fault.message, "Microphone permission denied");
    assert!(fault.ends_call);
}

#[test]
fn message_nested_under_error() {
    let fault = normalize(&json!({ "error": { "message": "Token expired" } }));
    assert_eq!(fault.message, "Token expired");
}

#[test]
fn message_nested_two_levels() {
    let fault = normalize(&json!({ "error": { "error": { "message": "X" } } }));
    assert_eq!(fault.message, "X");
}

#[test]
fn shallowest_match_wins() {
    let fault = normalize(&json!({
        "message": "outer",
        "error": { "message": "inner" }
    }));
    assert_eq!(fault.message, "outer");
}

#[test]
fn raw_string_payload_is_used_as_is() {
    let fault = normalize(&json!("connection reset"));
    assert_eq!(fault.message, "connection reset");
}

#[test]
fn empty_raw_string_falls_back() {
    // A blank payload must not become a blank notification
    let fault = normalize(&json!(""));
    assert_eq!(fault.message, FALLBACK_MESSAGE);
}

#[test]
fn empty_object_falls_back() {
    let fault = normalize(&json!({}));
    assert_eq!(fault.message, FALLBACK_MESSAGE);
}

#[test]
fn non_string_message_is_skipped() {
    // A mistyped message field must not surface as garbage
    let fault = normalize(&json!({ "message": 42 }));
    assert_eq!(fault.message, FALLBACK_MESSAGE);
}

#[test]
fn deeply_wrapped_without_message_falls_back() {
    let fault = normalize(&json!({ "error": { "error": { "code": 500 } } }));
    assert_eq!(fault.message, FALLBACK_MESSAGE);
}

#[test]
fn null_and_array_payloads_fall_back() {
    assert_eq!(normalize(&json!(null)).message, FALLBACK_MESSAGE);
    assert_eq!(normalize(&json!(["boom"])).message, FALLBACK_MESSAGE);
}
