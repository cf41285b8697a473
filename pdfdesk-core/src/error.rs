//! Error taxonomy for backend-facing operations
//!
//! Every non-2xx response is classified into an [`ApiError`] variant. Field
//! level validation failures (local or returned by the backend) are carried as
//! [`FieldErrors`], a map of field name to messages.

use crate::transport::{ApiResponse, TransportError};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Key under which messages that belong to no particular field are stored
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name to validation messages, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-field error set
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Convert into a `Result`, failing when at least one message was recorded
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Parse a Django REST Framework error body.
    ///
    /// Values may be a string, a list of strings or a nested object (nested
    /// keys are joined with a dot). `detail` is filed under
    /// [`NON_FIELD_ERRORS`].
    pub fn from_body(body: &Value) -> Self {
        let mut errors = Self::new();
        match body {
            Value::Object(map) => {
                for (key, value) in map {
                    let field = if key == "detail" { NON_FIELD_ERRORS } else { key.as_str() };
                    collect_messages(&mut errors, field, value);
                }
            }
            Value::Array(_) | Value::String(_) => collect_messages(&mut errors, NON_FIELD_ERRORS, body),
            _ => {}
        }
        errors
    }

    /// First message in field order, used for one-line notifications
    pub fn first_message(&self) -> Option<&str> {
        self.0.values().flat_map(|v| v.iter()).map(String::as_str).next()
    }
}

fn collect_messages(errors: &mut FieldErrors, field: &str, value: &Value) {
    match value {
        Value::String(message) => errors.add(field, message.clone()),
        Value::Array(items) => {
            for item in items {
                collect_messages(errors, field, item);
            }
        }
        Value::Object(nested) => {
            for (key, inner) in nested {
                collect_messages(errors, &format!("{}.{}", field, key), inner);
            }
        }
        Value::Null => {}
        other => errors.add(field, other.to_string()),
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> =
            self.0.iter().map(|(field, messages)| format!("{}: {}", field, messages.join(", "))).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl FromIterator<(String, String)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut errors = Self::new();
        for (field, message) in iter {
            errors.add(field, message);
        }
        errors
    }
}

/// Backend operation failure
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Resource {0} cannot be deleted")]
    NotDeletable(String),
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("Unexpected response ({status}): {message}")]
    Unexpected { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Session store error: {0}")]
    Session(String),
    #[error("Operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// Classify a non-success response by status code
    pub fn from_response(response: &ApiResponse) -> Self {
        let body = response.json_value();
        let message = body.as_ref().and_then(detail_message).unwrap_or_else(|| {
            response.status.canonical_reason().unwrap_or("request failed").to_string()
        });

        match response.status {
            StatusCode::BAD_REQUEST => {
                let errors = body.as_ref().map(FieldErrors::from_body).unwrap_or_default();
                if errors.is_empty() {
                    ApiError::Validation(FieldErrors::single(NON_FIELD_ERRORS, message))
                } else {
                    ApiError::Validation(errors)
                }
            }
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::CONFLICT => ApiError::Conflict(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::QuotaExceeded(message),
            status => ApiError::Unexpected { status: status.as_u16(), message },
        }
    }

    /// Local validation failure on a single field
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation(FieldErrors::single(field, message))
    }

    /// Field errors carried by this error, if any
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden(_))
    }

    /// Message suitable for a single user-facing notification.
    ///
    /// `fallback` is used for failures whose detail is not meant for end users.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            ApiError::Forbidden(_) => "You are not authorized to perform this action.".to_string(),
            ApiError::Validation(errors) => {
                errors.first_message().map(str::to_string).unwrap_or_else(|| fallback.to_string())
            }
            ApiError::QuotaExceeded(message) if !message.is_empty() => message.clone(),
            ApiError::NotDeletable(_) => "This item is in use and cannot be deleted.".to_string(),
            ApiError::Cancelled => "Operation cancelled.".to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Pull a human readable message out of a DRF error body
fn detail_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => ["detail", "error", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        Value::String(message) => Some(message.clone()),
        _ => None,
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;

    fn response(status: u16, body: Value) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: Some("application/json".to_string()),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(ApiError::from_response(&response(401, json!({}))), ApiError::Unauthorized));
        assert!(matches!(
            ApiError::from_response(&response(403, json!({"detail": "nope"}))),
            ApiError::Forbidden(m) if m == "nope"
        ));
        assert!(matches!(ApiError::from_response(&response(404, json!({}))), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_response(&response(409, json!({}))), ApiError::Conflict(_)));
        assert!(matches!(
            ApiError::from_response(&response(429, json!({"error": "Daily quota exceeded"}))),
            ApiError::QuotaExceeded(m) if m == "Daily quota exceeded"
        ));
        assert!(matches!(
            ApiError::from_response(&response(502, json!({}))),
            ApiError::Unexpected { status: 502, .. }
        ));
    }

    #[test]
    fn test_drf_field_errors_are_parsed() {
        let err = ApiError::from_response(&response(
            400,
            json!({
                "name": ["This field may not be blank."],
                "data": {"nationality": ["Unknown country"]},
                "non_field_errors": "Duplicate entry"
            }),
        ));

        let errors = err.field_errors().expect("validation error");
        assert_eq!(errors.get("name"), ["This field may not be blank."]);
        assert_eq!(errors.get("data.nationality"), ["Unknown country"]);
        assert_eq!(errors.get(NON_FIELD_ERRORS), ["Duplicate entry"]);
    }

    #[test]
    fn test_bad_request_without_body_still_reports() {
        let resp = ApiResponse {
            status: StatusCode::BAD_REQUEST,
            content_type: None,
            body: Bytes::new(),
        };
        let err = ApiError::from_response(&resp);
        assert_eq!(err.field_errors().unwrap().get(NON_FIELD_ERRORS), ["Bad Request"]);
    }

    #[test]
    fn test_user_message_hides_internal_detail() {
        let err = ApiError::Unexpected { status: 500, message: "Traceback ...".into() };
        assert_eq!(err.user_message("Failed to save field"), "Failed to save field");
        assert_eq!(
            ApiError::Forbidden("x".into()).user_message("Failed"),
            "You are not authorized to perform this action."
        );
        let validation = ApiError::invalid("name", "Name is required");
        assert_eq!(validation.user_message("Failed"), "Name is required");
    }
}
