use serde_json::Value;
use thiserror::Error;

/// Failure of a single exchange through the API gateway
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response arrived (connection refused, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The server rejected the bearer credential (HTTP 401)
    #[error("Unauthorized: {}", .detail.as_deref().unwrap_or("credentials rejected"))]
    Unauthorized { detail: Option<String> },

    /// Any other non-success status, usually a validation failure
    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("request failed"))]
    Status { status: u16, detail: Option<String> },

    /// The body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build the error for a non-success response
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = extract_detail(body);
        if status == 401 {
            ApiError::Unauthorized { detail }
        } else {
            ApiError::Status { status, detail }
        }
    }

    /// Server-provided detail message, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Status { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }

    /// Status code carried by the failure, if a response arrived
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a query may be retried after this failure
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network(format!("request timed out: {}", err))
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Pull the `detail` field out of an error body.
///
/// FastAPI-style servers send either a plain string or a list of validation
/// entries, each with a `msg` field.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|e| e.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// Failure of a session operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("A sign-in attempt is already in progress")]
    InProgress,

    /// `message` is the same text stored as the session's last error
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl SessionError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Rejected { source, .. } => Some(source),
            SessionError::InProgress => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_detail() {
        let err = ApiError::from_status(400, r#"{"detail":"Incorrect credentials"}"#);
        assert_eq!(
            err,
            ApiError::Status {
                status: 400,
                detail: Some("Incorrect credentials".to_string())
            }
        );
        assert_eq!(err.detail(), Some("Incorrect credentials"));
    }

    #[test]
    fn test_validation_array_detail() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"},{"msg":"field required"}]}"#;
        let err = ApiError::from_status(422, body);
        assert_eq!(
            err.detail(),
            Some("value is not a valid email address; field required")
        );
    }

    #[test]
    fn test_unauthorized_and_missing_detail() {
        let err = ApiError::from_status(401, "not json");
        assert_eq!(err, ApiError::Unauthorized { detail: None });
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Unauthorized: credentials rejected");
    }

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Network("refused".into()).is_transient());
        assert!(ApiError::from_status(503, "").is_transient());
        assert!(!ApiError::from_status(400, "").is_transient());
        assert!(!ApiError::from_status(401, "").is_transient());
        assert!(!ApiError::Decode("bad".into()).is_transient());
    }
}
