//! Response envelope
//!
//! Every dispatched call ends in exactly one of four shapes:
//!
//! | shape | status | body |
//! |---|---|---|
//! | success | declared (200/201) | `{"value":{"result":<T>}}` |
//! | rejected | 400 | `[{"message":..,"messageType":"Negative"},..]` |
//! | incidents | 400 | `{"value":{"result":null,"listNotification":[..]}}` |
//! | fault | 400 | `{"value":"<message>"}` |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use screenmusic_common::{Incident, Notification};

/// Outcome of one dispatched call, ready for the wire
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Value with no negative notifications
    Success { status: StatusCode, result: Value },
    /// Negative notifications only; positives are dropped before this point
    Rejected(Vec<Notification>),
    /// Structured business fault
    Incidents(Vec<Incident>),
    /// Any other failure, carrying the raw message
    Fault(String),
}

impl Envelope {
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Envelope::Success { status, .. } => *status,
            Envelope::Rejected(_) | Envelope::Incidents(_) | Envelope::Fault(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    /// Wire body for this shape
    pub fn to_json(&self) -> Value {
        match self {
            Envelope::Success { result, .. } => json!({ "value": { "result": result } }),
            Envelope::Rejected(negatives) => json!(negatives),
            Envelope::Incidents(incidents) => json!({
                "value": {
                    "result": Value::Null,
                    "listNotification": incidents,
                }
            }),
            Envelope::Fault(message) => json!({ "value": message }),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let envelope = Envelope::Success {
            status: StatusCode::CREATED,
            result: json!("17"),
        };

        assert_eq!(envelope.status(), StatusCode::CREATED);
        assert_eq!(envelope.to_json(), json!({"value": {"result": "17"}}));
    }

    #[test]
    fn test_rejected_shape_is_bare_list() {
        let envelope = Envelope::Rejected(vec![Notification::negative("not found")]);

        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            envelope.to_json(),
            json!([{"message": "not found", "messageType": "Negative"}])
        );
    }

    #[test]
    fn test_incidents_shape() {
        let envelope = Envelope::Incidents(vec![Incident::new("name", "Name is required")]);

        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            envelope.to_json(),
            json!({
                "value": {
                    "result": null,
                    "listNotification": [{"key": "name", "message": "Name is required"}]
                }
            })
        );
    }

    #[test]
    fn test_fault_shape() {
        let envelope = Envelope::fault("DB timeout");

        assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
        assert_eq!(envelope.to_json(), json!({"value": "DB timeout"}));
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_into_response_uses_envelope_status() {
        let response = Envelope::Success {
            status: StatusCode::OK,
            result: json!(true),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
