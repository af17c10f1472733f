//! Error types for easy-kit.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Interaction error: {0}")]
    Interaction(#[from] InteractionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures fetching or decoding the branding and step documents.
///
/// These are the only failures that end a wizard session.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Missing kit or module selection")]
    MissingSelection,

    #[error("Invalid {field} identifier: {value:?}")]
    InvalidSelection { field: &'static str, value: String },

    #[error("Could not fetch {document}: HTTP {status}")]
    Http { document: String, status: u16 },

    #[error("Request for {document} failed: {reason}")]
    Request { document: String, reason: String },

    #[error("Could not read {document}: {source}")]
    Io {
        document: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse {document}: {source}")]
    Parse {
        document: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Structural problems in a step document that make it unusable.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Duplicate step id: {0}")]
    DuplicateId(String),

    #[error("Step {step} is missing required field {field}")]
    MissingField { step: String, field: &'static str },
}

/// A cursor move the wizard state refuses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("Session already complete")]
    Finished,

    #[error("Index {index} out of range for {step_count} steps")]
    OutOfRange { index: usize, step_count: usize },
}

/// Classification of a failed webhook interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ConfigError,
    ValidationError,
    NetworkError,
    TimeoutError,
    ServerError,
    ResponseError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::ServerError => "SERVER_ERROR",
            Self::ResponseError => "RESPONSE_ERROR",
        };
        write!(f, "{s}")
    }
}

/// A recoverable error raised while talking to a webhook.
///
/// Displayed inline on the step that triggered it; the session continues.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct InteractionError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl InteractionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Step configuration is missing required fields (e.g. `webhookUrl`).
    pub fn config(missing: &[&str]) -> Self {
        Self::new(
            ErrorKind::ConfigError,
            format!(
                "Configuration error: Missing required fields: {}",
                missing.join(", ")
            ),
        )
        .with_details(serde_json::json!({ "missingFields": missing }))
    }

    /// Required responses were never recorded or are blank.
    pub fn validation(missing: &[String]) -> Self {
        Self::new(
            ErrorKind::ValidationError,
            format!("Please complete all required fields: {}", missing.join(", ")),
        )
        .with_details(serde_json::json!({ "missingFields": missing }))
    }

    pub fn timeout(timeout: Duration, url: &str) -> Self {
        Self::new(
            ErrorKind::TimeoutError,
            format!("Request timed out after {}ms", timeout.as_millis()),
        )
        .with_details(serde_json::json!({ "timeoutMs": timeout.as_millis() as u64, "url": url }))
    }

    pub fn network(reason: impl Into<String>, url: &str) -> Self {
        Self::new(
            ErrorKind::NetworkError,
            "Network error, check your connection",
        )
        .with_details(serde_json::json!({ "originalError": reason.into(), "url": url }))
    }

    /// Non-2xx HTTP status.
    pub fn server_status(status: u16, status_text: &str, url: &str) -> Self {
        Self::new(
            ErrorKind::ServerError,
            format!("Server returned error: {status} {status_text}")
                .trim_end()
                .to_string(),
        )
        .with_details(serde_json::json!({
            "status": status,
            "statusText": status_text,
            "url": url,
        }))
    }

    /// The server answered but reported the failure itself.
    pub fn server_reported(message: Option<&str>, details: Option<serde_json::Value>) -> Self {
        let err = Self::new(
            ErrorKind::ServerError,
            message.unwrap_or("Server processing failed"),
        );
        match details {
            Some(d) => err.with_details(serde_json::json!({ "serverDetails": d })),
            None => err,
        }
    }

    pub fn response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResponseError, message)
    }

    /// HTTP status carried by a `SERVER_ERROR` raised from a non-2xx reply.
    pub fn status(&self) -> Option<u16> {
        self.details
            .as_ref()
            .and_then(|d| d.get("status"))
            .and_then(|s| s.as_u64())
            .map(|s| s as u16)
    }

    /// Text shown inline on the step.
    pub fn display_text(&self) -> String {
        match self.kind {
            ErrorKind::ConfigError => format!("Error: {}", self.message),
            _ => format!("Error: {}. Please try again.", self.message),
        }
    }

    /// Emit a structured diagnostic for this error.
    pub fn log(&self, context: &serde_json::Value) {
        tracing::error!(
            kind = %self.kind,
            message = %self.message,
            details = ?self.details,
            timestamp = %self.timestamp.to_rfc3339(),
            context = %context,
            "Interaction error"
        );
    }
}

/// Result type alias for easy-kit.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_matches_serde() {
        let kinds = [
            ErrorKind::ConfigError,
            ErrorKind::ValidationError,
            ErrorKind::NetworkError,
            ErrorKind::TimeoutError,
            ErrorKind::ServerError,
            ErrorKind::ResponseError,
        ];
        for kind in kinds {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(format!("\"{kind}\""), json);
        }
    }

    #[test]
    fn server_reported_message_renders_inline() {
        let err = InteractionError::server_reported(Some("bad input"), None);
        assert_eq!(err.kind, ErrorKind::ServerError);
        assert_eq!(err.display_text(), "Error: bad input. Please try again.");
    }

    #[test]
    fn server_reported_defaults_message() {
        let err = InteractionError::server_reported(None, Some(serde_json::json!("trace")));
        assert_eq!(err.message, "Server processing failed");
        assert_eq!(err.details.unwrap()["serverDetails"], "trace");
    }

    #[test]
    fn server_status_carries_code() {
        let err = InteractionError::server_status(500, "Internal Server Error", "http://x");
        assert_eq!(err.status(), Some(500));
        assert!(err.message.contains("500"));
    }

    #[test]
    fn config_error_has_no_retry_hint() {
        let err = InteractionError::config(&["webhookUrl"]);
        assert_eq!(err.kind, ErrorKind::ConfigError);
        assert_eq!(
            err.display_text(),
            "Error: Configuration error: Missing required fields: webhookUrl"
        );
    }

    #[test]
    fn validation_lists_fields() {
        let err = InteractionError::validation(&["goal".to_string(), "name".to_string()]);
        assert_eq!(err.message, "Please complete all required fields: goal, name");
        assert_eq!(err.details.unwrap()["missingFields"][1], "name");
    }

    #[test]
    fn interaction_error_lifts_into_top_level() {
        let err: Error = InteractionError::response("nothing").into();
        assert!(err.to_string().contains("nothing"));
    }
}
