//! Backend error decoding.
//!
//! Every non-success response is decoded once, here, into an [`ApiError`].
//! Views never inspect raw JSON: they match on the variant and ask for
//! [`ApiError::display_message`].

use std::collections::BTreeMap;
use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Machine codes the backend uses for uniqueness violations.
const CONFLICT_CODES: &[&str] = &["unique", "already_exists", "conflict", "duplicate"];

/// Key the backend uses for errors not tied to a single field.
const NON_FIELD_KEY: &str = "non_field_errors";

/// Errors that can occur when calling the lending backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused, timeout).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend rejected the bearer token (HTTP 401).
    #[error("Authentication rejected by backend")]
    Unauthorized,

    /// The principal lacks permission for the operation (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The resource does not exist (HTTP 404).
    #[error("Not found")]
    NotFound,

    /// Field-level validation failure.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Uniqueness violation, identified by HTTP 409 or a conflict code.
    #[error("Conflict ({code}): {detail}")]
    Conflict {
        /// Backend machine code (`unique`, `already_exists`, ...).
        code: String,
        /// Backend human-readable detail.
        detail: String,
    },

    /// A single backend message (`detail` or `message`).
    #[error("Backend error: {0}")]
    Detail(String),

    /// A response this client could not interpret.
    #[error("Unexpected backend response (HTTP {status})")]
    Unexpected {
        /// HTTP status code of the response.
        status: u16,
    },

    /// A success response whose body did not match the expected schema.
    #[error("Failed to decode backend response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Decode a non-success response into the matching variant.
    ///
    /// Unknown body shapes fall back to [`ApiError::Unexpected`].
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return Self::Unauthorized;
        }

        let parsed = serde_json::from_str::<ErrorBody>(body).ok();

        if status == StatusCode::CONFLICT {
            let (code, detail) = match parsed {
                Some(ErrorBody {
                    code: Some(code),
                    detail,
                    ..
                }) => (code, detail.unwrap_or_default()),
                Some(body) => ("conflict".to_string(), body.summary()),
                None => ("conflict".to_string(), String::new()),
            };
            return Self::Conflict { code, detail };
        }

        if status == StatusCode::FORBIDDEN {
            return Self::Forbidden(parsed.map(ErrorBody::summary).unwrap_or_default());
        }

        if status == StatusCode::NOT_FOUND {
            return Self::NotFound;
        }

        let Some(body) = parsed else {
            return Self::Unexpected {
                status: status.as_u16(),
            };
        };

        if let Some(code) = body.code.as_deref()
            && CONFLICT_CODES.contains(&code)
        {
            return Self::Conflict {
                code: code.to_string(),
                detail: body.detail.unwrap_or_default(),
            };
        }

        // Loose field maps count only on client errors; a coded body's
        // `fields` always does.
        let fields = body.field_errors(status.is_client_error());
        if !fields.is_empty() {
            return Self::Validation(fields);
        }

        match body {
            ErrorBody {
                detail: Some(detail),
                ..
            }
            | ErrorBody {
                message: Some(detail),
                ..
            }
            | ErrorBody {
                code: Some(detail),
                ..
            } => Self::Detail(detail),
            _ => Self::Unexpected {
                status: status.as_u16(),
            },
        }
    }

    /// Whether this is a uniqueness conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Message suitable for showing to the person using the console.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Forbidden(detail) if !detail.is_empty() => detail.clone(),
            Self::Forbidden(_) => "You do not have permission to do that.".to_string(),
            Self::NotFound => "The requested record no longer exists.".to_string(),
            Self::Validation(fields) => fields.to_string(),
            Self::Conflict { detail, .. } if !detail.is_empty() => detail.clone(),
            Self::Conflict { .. } => "This record already exists.".to_string(),
            Self::Detail(detail) => detail.clone(),
            Self::Unexpected { .. } | Self::Decode(_) => {
                "Something went wrong on the server. Please try again.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err)
        }
    }
}

// =============================================================================
// Field errors
// =============================================================================

/// Per-field validation messages, keyed by backend field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Messages>);

impl FieldErrors {
    /// Whether there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for a single field.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Messages::as_slice)
    }

    /// Iterate over `(field, messages)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl FromIterator<(String, Vec<String>)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k, Messages::Many(v))).collect())
    }
}

impl fmt::Display for FieldErrors {
    /// Joins messages as `field: message`, separated by `; `.
    /// Non-field errors come first, without a prefix.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let general = self.get(NON_FIELD_KEY).iter().map(|m| (None, m));
        let per_field = self
            .iter()
            .filter(|(field, _)| *field != NON_FIELD_KEY)
            .flat_map(|(field, messages)| messages.iter().map(move |m| (Some(field), m)));

        for (i, (field, message)) in general.chain(per_field).enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            match field {
                Some(field) => write!(f, "{field}: {message}")?,
                None => f.write_str(message)?,
            }
        }
        Ok(())
    }
}

/// One message or a list of messages for a field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Messages {
    One(String),
    Many(Vec<String>),
}

impl Messages {
    fn as_slice(&self) -> &[String] {
        match self {
            Self::One(message) => std::slice::from_ref(message),
            Self::Many(messages) => messages,
        }
    }
}

// =============================================================================
// Wire schema
// =============================================================================

/// Error body as the backend sends it.
///
/// Known shapes: `{"code", "detail", "fields"}`, `{"detail"}`,
/// `{"message"}` and a bare `{"field": ["message", ...]}` map. Bodies mix
/// them, so every key is read and the rest are treated as field messages.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    fields: Option<FieldErrors>,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

impl ErrorBody {
    /// Field messages from `fields` and, when `loose`, from any other key
    /// holding a message or a list of messages. A `detail` sent alongside
    /// them is kept as a non-field message.
    fn field_errors(&self, loose: bool) -> FieldErrors {
        let mut map: BTreeMap<String, Messages> = self
            .fields
            .iter()
            .flat_map(|fields| fields.0.iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (key, value) in self.rest.iter().filter(|_| loose) {
            if let Ok(messages) = serde_json::from_value::<Messages>(value.clone()) {
                map.entry(key.clone()).or_insert(messages);
            }
        }
        if !map.is_empty()
            && let Some(detail) = self.detail.as_ref().or(self.message.as_ref())
        {
            map.entry(NON_FIELD_KEY.to_string())
                .or_insert_with(|| Messages::One(detail.clone()));
        }
        FieldErrors(map)
    }

    fn summary(self) -> String {
        if let Some(text) = self.detail.clone().or_else(|| self.message.clone()) {
            return text;
        }
        let fields = self.field_errors(true);
        if fields.is_empty() {
            self.code.unwrap_or_default()
        } else {
            fields.to_string()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_401_is_unauthorized_regardless_of_body() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, r#"{"detail":"expired"}"#);
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_field_errors_are_joined() {
        let body = r#"{"nombre":["This field is required."],"telefono":"Invalid phone."}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body);
        let ApiError::Validation(fields) = &err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(fields.get("nombre"), ["This field is required."]);
        assert_eq!(
            err.display_message(),
            "nombre: This field is required.; telefono: Invalid phone."
        );
    }

    #[test]
    fn test_non_field_errors_have_no_prefix() {
        let body = r#"{"non_field_errors":["Amount out of range."]}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.display_message(), "Amount out of range.");
    }

    #[test]
    fn test_detail_and_message_shapes() {
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"detail":"Bad amount"}"#);
        assert!(matches!(err, ApiError::Detail(ref d) if d == "Bad amount"));

        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"message":"Nope"}"#);
        assert!(matches!(err, ApiError::Detail(ref d) if d == "Nope"));
    }

    #[test]
    fn test_conflict_by_status() {
        let body = r#"{"code":"unique","detail":"documentation already exists"}"#;
        let err = ApiError::from_response(StatusCode::CONFLICT, body);
        assert!(matches!(err, ApiError::Conflict { ref code, .. } if code == "unique"));
    }

    #[test]
    fn test_conflict_by_code_on_400() {
        let body = r#"{"code":"already_exists","detail":"duplicate"}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body);
        assert!(err.is_conflict());
    }

    #[test]
    fn test_coded_body_with_fields_is_validation() {
        let body = r#"{"code":"invalid","fields":{"monto":["Too low."]}}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.display_message(), "monto: Too low.");
    }

    #[test]
    fn test_undecodable_body_falls_back() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert!(matches!(err, ApiError::Unexpected { status: 500 }));
        assert_eq!(
            err.display_message(),
            "Something went wrong on the server. Please try again."
        );
    }

    #[test]
    fn test_server_error_with_field_shape_is_not_validation() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, r#"{"a":["b"]}"#);
        assert!(matches!(err, ApiError::Unexpected { status: 502 }));
    }

    #[test]
    fn test_detail_with_field_messages_keeps_both() {
        let body = r#"{"detail":"Invalid input","nombre":["Required."]}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body);
        let ApiError::Validation(fields) = &err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(fields.get("nombre"), ["Required."]);
        assert_eq!(err.display_message(), "Invalid input; nombre: Required.");
    }

    #[test]
    fn test_server_error_extra_keys_are_not_field_messages() {
        let body = r#"{"code":"boom","detail":"Database down","trace":"abc"}"#;
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert!(matches!(err, ApiError::Detail(ref d) if d == "Database down"));
    }

    #[test]
    fn test_non_object_values_are_not_field_messages() {
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, r#"{"detail":"Bad amount","status":400}"#);
        assert!(matches!(err, ApiError::Detail(ref d) if d == "Bad amount"));
    }

    #[test]
    fn test_forbidden_and_not_found() {
        let err = ApiError::from_response(StatusCode::FORBIDDEN, "");
        assert_eq!(err.display_message(), "You do not have permission to do that.");
        assert!(matches!(
            ApiError::from_response(StatusCode::NOT_FOUND, "{}"),
            ApiError::NotFound
        ));
    }
}
