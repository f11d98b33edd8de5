//! Wire format of a session.
//!
//! The client writes one message and half-closes. Only the text after the
//! last newline counts, and it must be `{"action": "<label>"}` with no other
//! fields. The server answers with the observation as a six-field JSON
//! object, or with nothing at all when the request could not be served.

use crate::error::{Result, SessionError};
use catalog::Observation;
use environment::Action;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActionRequest {
    action: String,
}

/// Decode raw request bytes into an action. `labels[0]` maps to `Upvote`,
/// any other label to `Downvote`.
pub fn decode_request(raw: &[u8], labels: &[String; 2]) -> Result<Action> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| SessionError::MalformedRequest(format!("request is not UTF-8: {}", e)))?;

    // Trailing newlines are accepted: `{"action": "like"}\n` is a valid request
    let text = text.trim_end_matches(['\r', '\n']);
    let last_line = match text.rfind('\n') {
        Some(pos) => &text[pos + 1..],
        None => text,
    };

    let request: ActionRequest = serde_json::from_str(last_line)
        .map_err(|e| SessionError::MalformedRequest(format!("{:?}: {}", last_line, e)))?;
    Ok(Action::from_label(&request.action, labels))
}

/// Encode an observation as the response body
pub fn encode_observation(observation: &Observation) -> String {
    serde_json::to_string(observation).unwrap_or_else(|e| {
        warn!("Failed to encode observation {}: {}", observation.id, e);
        String::new()
    })
}

/// Decode a response body back into an observation
pub fn decode_observation(body: &str) -> Result<Observation> {
    Ok(serde_json::from_str(body)?)
}
