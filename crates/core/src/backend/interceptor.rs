use serde_json::Value;
use tracing::{error, warn};

use crate::errors::CoreError;
use crate::models::alert::Severity;
use crate::services::alert_service::AlertChannel;

/// Single cross-cutting inspection point for backend answers.
///
/// Call sites only look at status codes; turning a failed response into a
/// user-visible message happens here.
#[derive(Debug, Clone, Default)]
pub struct ResponseInterceptor {
    alerts: Option<AlertChannel>,
}

impl ResponseInterceptor {
    pub fn new(alerts: Option<AlertChannel>) -> Self {
        Self { alerts }
    }

    /// Inspect an HTTP answer. Non-2xx bodies carrying a `message` are
    /// published as errors; a 401 is flagged for the login flow.
    pub fn on_response(&self, operation: &str, status: u16, body: &str) {
        if (200..300).contains(&status) {
            return;
        }

        if status == 401 {
            // TODO: redirect to sign-in once the auth flow lands in the client.
            warn!(operation, status, "backend requires authentication");
        }

        match extract_message(body) {
            Some(message) => {
                error!(operation, status, %message, "backend request failed");
                if let Some(alerts) = &self.alerts {
                    alerts.show(message, Severity::Error);
                }
            }
            None => error!(operation, status, "backend request failed without a message"),
        }
    }

    /// Record a request that never got an HTTP answer.
    pub fn on_transport_error(&self, operation: &str, err: &CoreError) {
        error!(operation, error = %err, "backend request did not complete");
    }
}

/// Pull a human-readable `message` out of an error body. Accepts a string or
/// an array of strings (validation errors), joined with ", ".
pub fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = match value.get("message")? {
        Value::String(s) => s.trim().to_string(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    Some(message).filter(|m| !m.is_empty())
}
