//! # Gateway errors
//!
//! Every gateway call resolves to [`ApiResult`]. The three failure kinds are
//! kept apart in [`ApiError`] so callers can branch on them, but each one
//! renders (via `Display` or [`ApiError::message`]) to the single
//! human-readable string that pages show verbatim.
//!
//! | Variant | Cause |
//! |---------|-------|
//! | [`ApiError::Network`] | No response: connection refused, DNS failure, or the request could not be built. |
//! | [`ApiError::Http`] | The backend answered with a non-2xx status. |
//! | [`ApiError::Decode`] | A 2xx body that is not the expected JSON. |

use reqwest::StatusCode;
use serde_json::Value;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Network(String),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("{0}")]
    Decode(String),
}

impl ApiError {
    /// Build an HTTP error from a non-2xx status and its raw body.
    ///
    /// A JSON body with a string `detail` yields that string. FastAPI
    /// validation errors (`detail` as a list) yield their `msg` fields joined
    /// with `"; "`. JSON without a usable `detail` yields `"HTTP <code>"`. A body
    /// that is not JSON yields the status reason phrase.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = match serde_json::from_str::<Value>(body) {
            Ok(json) => detail_message(&json).unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            Err(_) => status_text(status),
        };
        ApiError::Http {
            status: status.as_u16(),
            message,
        }
    }

    pub(crate) fn network(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::Network(format!("Invalid request: {err}"))
        } else {
            ApiError::Network(err.to_string())
        }
    }

    /// The user-visible message.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Network(message) | ApiError::Decode(message) => message,
            ApiError::Http { message, .. } => message,
        }
    }

    /// HTTP status for backend rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The token was missing, invalid or expired.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

fn detail_message(json: &Value) -> Option<String> {
    match json.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        Value::Array(items) if !items.is_empty() => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                Some(Value::Array(items.clone()).to_string())
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Null | Value::Bool(false) | Value::String(_) | Value::Array(_) => None,
        other => Some(other.to_string()),
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_string_is_surfaced() {
        let err = ApiError::from_response(
            StatusCode::UNAUTHORIZED,
            r#"{"detail": "Incorrect username or password"}"#,
        );
        assert_eq!(err.to_string(), "Incorrect username or password");
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_unparsable_body_falls_back_to_status_text() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "<html>upstream</html>");
        assert_eq!(err.message(), "Bad Gateway");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn test_empty_body_falls_back_to_status_text() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, "");
        assert_eq!(err.message(), "Not Found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_json_without_detail() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": "boom"}"#);
        assert_eq!(err.message(), "HTTP 500");

        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"detail": ""}"#);
        assert_eq!(err.message(), "HTTP 400");
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let body = r#"{"detail": [
            {"loc": ["query", "q"], "msg": "field required", "type": "value_error.missing"},
            {"loc": ["query", "limit"], "msg": "value is not a valid integer", "type": "type_error.integer"}
        ]}"#;
        let err = ApiError::from_response(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(err.message(), "field required; value is not a valid integer");
    }

    #[test]
    fn test_unknown_status_without_reason() {
        let status = StatusCode::from_u16(599).unwrap();
        let err = ApiError::from_response(status, "not json");
        assert_eq!(err.message(), "HTTP 599");
    }

    #[test]
    fn test_non_http_errors_have_no_status() {
        let err = ApiError::Decode("expected value at line 1 column 1".into());
        assert_eq!(err.status(), None);
        assert!(!err.is_unauthorized());
        assert_eq!(err.message(), "expected value at line 1 column 1");
    }
}
