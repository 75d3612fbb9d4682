//! Decoding of task API responses.
//!
//! The task endpoints answer with `{ "success": bool, "data": Task, "error":
//! { "code", "message" } }`, although some callers only look at the HTTP
//! status and some bodies carry the bare task. Everything is folded into a
//! single `Result` here so nothing downstream inspects response shapes.

use serde::Deserialize;
use serde_json::Value;

use crate::store::error::StoreError;
use crate::task::Task;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<ApiError>,
}

/// Error payload of a failed call.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

fn is_success_status(http_status: u16) -> bool {
    (200..300).contains(&http_status)
}

fn remote_error(http_status: u16, error: Option<ApiError>) -> StoreError {
    match error {
        Some(ApiError { code, message }) => StoreError::Remote { code, message },
        None => StoreError::Remote {
            code: format!("HTTP_{http_status}"),
            message: "request failed".to_string(),
        },
    }
}

/// Decode a task endpoint response into the updated task.
pub fn decode_response(http_status: u16, body: &str) -> Result<Task, StoreError> {
    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if !is_success_status(http_status) => return Err(remote_error(http_status, None)),
        Err(e) => return Err(StoreError::Malformed(e.to_string())),
    };

    if !is_success_status(http_status) || envelope.success == Some(false) {
        return Err(remote_error(http_status, envelope.error));
    }

    match envelope.data {
        Some(data) => serde_json::from_value(data).map_err(|e| StoreError::Malformed(e.to_string())),
        // No envelope at all: the body is the task itself.
        None if envelope.success.is_none() => {
            serde_json::from_str(body).map_err(|e| StoreError::Malformed(e.to_string()))
        }
        None => Err(StoreError::Malformed("response carries no task".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;

    const TASK: &str = r#"{"id":"t1","project_id":"p1","title":"Ship","status":"done","visibility":"published","created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-02T00:00:00Z"}"#;

    #[test]
    fn test_success_envelope() {
        let body = format!(r#"{{"success":true,"data":{TASK},"error":null}}"#);
        let task = decode_response(200, &body).unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.workflow_status(), Some(Status::Done));
    }

    #[test]
    fn test_bare_task_body() {
        assert_eq!(decode_response(200, TASK).unwrap().id, "t1");
    }

    #[test]
    fn test_error_envelope() {
        let body = r#"{"success":false,"data":null,"error":{"code":"NOT_FOUND","message":"no such task"}}"#;
        match decode_response(404, body) {
            Err(StoreError::Remote { code, message }) => {
                assert_eq!(code, "NOT_FOUND");
                assert_eq!(message, "no such task");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_success_false_with_ok_status_is_failure() {
        let body = r#"{"success":false,"data":null,"error":{"code":"DB_ERROR","message":"boom"}}"#;
        assert!(matches!(decode_response(200, body), Err(StoreError::Remote { .. })));
    }

    #[test]
    fn test_non_json_bodies() {
        assert!(matches!(decode_response(502, "<html>bad gateway</html>"), Err(StoreError::Remote { code, .. }) if code == "HTTP_502"));
        assert!(matches!(decode_response(200, "not json"), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_success_without_task_is_malformed() {
        assert!(matches!(decode_response(200, r#"{"success":true}"#), Err(StoreError::Malformed(_))));
        assert!(matches!(decode_response(200, r#"{"success":true,"data":null}"#), Err(StoreError::Malformed(_))));
        assert!(matches!(decode_response(200, r#"{"success":true,"data":{"id":1}}"#), Err(StoreError::Malformed(_))));
    }
}
