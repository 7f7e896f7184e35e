//! Mapping of failed downstream calls onto [`OrchestrationError`].

use domain::OrchestrationError;
use serde::Deserialize;

#[derive(Deserialize)]
struct ErrorInfo {
    message: Option<String>,
}

/// Classifies a non-success downstream response.
///
/// 404 → `NotFound`, 400 → `InvalidInput`, anything else → `Upstream` with the
/// original status and body.
pub fn classify(status: u16, body: &str) -> OrchestrationError {
    match status {
        404 => OrchestrationError::NotFound(error_message(body)),
        400 => OrchestrationError::InvalidInput(error_message(body)),
        _ => {
            tracing::warn!(status, body, "unexpected downstream error");
            OrchestrationError::Upstream {
                status,
                body: body.to_string(),
            }
        }
    }
}

/// Classifies a call that produced no response at all.
pub fn transport_failure(err: &reqwest::Error) -> OrchestrationError {
    let status = if err.is_timeout() { 504 } else { 502 };
    tracing::warn!(status, error = %err, "downstream unreachable");
    OrchestrationError::Upstream {
        status,
        body: err.to_string(),
    }
}

/// Extracts `message` from a downstream JSON error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorInfo>(body)
        .ok()
        .and_then(|info| info.message)
        .unwrap_or_else(|| body.to_string())
}
