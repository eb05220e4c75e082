//! Normalization of provider error payloads
//!
//! Upstream providers wrap errors inconsistently, sometimes several levels
//! deep. The extraction rules below are tried in order, first match wins,
//! so a new provider shape means adding a path here and nothing else.

use serde::Serialize;
use serde_json::Value;

/// Shown when no message can be extracted from the payload
pub const FALLBACK_MESSAGE: &str = "Call ended unexpectedly";

/// Message locations observed from the provider, shallowest first
const MESSAGE_PATHS: &[&[&str]] = &[
    &["message"],
    &["error", "message"],
    &["error", "error", "message"],
];

/// A channel error reduced to what the UI needs
#[derive(Debug, Clone, Serialize)]
pub struct Fault {
    pub message: String,
    /// Every surfaced error currently ends the call
    pub ends_call: bool,
}

/// Reduce an arbitrary error payload to a single display message
pub fn normalize(payload: &Value) -> Fault {
    for path in MESSAGE_PATHS {
        if let Some(message) = extract_string(payload, path) {
            return Fault {
                message,
                ends_call: true,
            };
        }
    }

    if let Value::String(raw) = payload {
        // A blank raw payload would surface as an empty notification;
        // deliberately prefer the fixed fallback over showing nothing
        if !raw.is_empty() {
            return Fault {
                message: raw.clone(),
                ends_call: true,
            };
        }
    }

    Fault {
        message: FALLBACK_MESSAGE.to_string(),
        ends_call: true,
    }
}

fn extract_string(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str().map(str::to_string)
}
