use serde_json::Value;

use crate::OptimizePayload;

/// How one submission ended, as seen by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOutcome {
    Success(OptimizePayload),
    HttpError { status: u16, body: String },
    Timeout,
    UserCancelled,
    NetworkError(String),
}

impl TransportOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            TransportOutcome::Success(_) => "success",
            TransportOutcome::HttpError { .. } => "http_error",
            TransportOutcome::Timeout => "timeout",
            TransportOutcome::UserCancelled => "user_cancelled",
            TransportOutcome::NetworkError(_) => "network_error",
        }
    }
}

/// Extracts a human-readable message from an error body.
///
/// FastAPI bodies carry `detail` (a string, or a list of `{msg}` objects for
/// validation errors). Plain-text bodies are returned trimmed.
pub fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(json) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };

    match json.get("detail") {
        Some(Value::String(detail)) if !detail.trim().is_empty() => {
            return Some(detail.trim().to_string())
        }
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                return Some(joined);
            }
        }
        _ => {}
    }

    ["message", "error"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(ToOwned::to_owned)
}
