//! Error types for trails operations.
//!
//! Every failure the review loop can surface is a variant of [`TrailsError`],
//! carrying a stable [`ErrorCode`] and, where one exists, a suggestion the UI
//! can show next to the failed action.

use std::collections::HashMap;
use thiserror::Error;

use crate::types::CardId;

/// Result type alias for trails operations.
pub type TrailsResult<T> = Result<T, TrailsError>;

/// Main error type for all trails operations.
#[derive(Error, Debug)]
pub enum TrailsError {
    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// Transport failure or timeout.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Missing, expired or rejected credentials.
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server rejected a mutation.
    #[error("Conflict: {message}")]
    Conflict { message: String, code: ErrorCode },

    /// Deck or card no longer exists server-side.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        resource_id: Option<String>,
    },

    /// Operation is not legal in the current review state.
    #[error("Invalid state: {message}")]
    InvalidState { message: String, code: ErrorCode },

    /// A mutation for the same card is still outstanding.
    #[error("Card {card_id} has a pending change")]
    Pending { card_id: CardId, code: ErrorCode },

    /// Any other non-success HTTP status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: ErrorCode,
    },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (AUTH_xxx)
    AuthInvalidToken,
    AuthForbidden,
    AuthMissingCredentials,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValInvalidFormat,
    ValRejectedByServer,

    // Resources (RES_xxx)
    ResDeckNotFound,
    ResCardNotFound,
    ResNotFound,
    ResConflict,

    // Review state (REV_xxx)
    RevInvalidState,
    RevPendingMutation,

    // Network (NET_xxx)
    NetTimeout,
    NetConnectionFailed,
    NetUnexpectedStatus,

    // Parse (PARSE_xxx)
    ParseInvalidJson,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthInvalidToken => "AUTH_001",
            ErrorCode::AuthForbidden => "AUTH_002",
            ErrorCode::AuthMissingCredentials => "AUTH_003",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValInvalidFormat => "VAL_003",
            ErrorCode::ValRejectedByServer => "VAL_004",
            ErrorCode::ResDeckNotFound => "RES_001",
            ErrorCode::ResCardNotFound => "RES_002",
            ErrorCode::ResNotFound => "RES_003",
            ErrorCode::ResConflict => "RES_004",
            ErrorCode::RevInvalidState => "REV_001",
            ErrorCode::RevPendingMutation => "REV_002",
            ErrorCode::NetTimeout => "NET_001",
            ErrorCode::NetConnectionFailed => "NET_002",
            ErrorCode::NetUnexpectedStatus => "NET_003",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl TrailsError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create a validation error with suggestion.
    pub fn validation_with_suggestion(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a validation error for a blank required field.
    pub fn missing_field(field: &str) -> Self {
        let mut details = HashMap::new();
        details.insert("field".to_string(), field.to_string());
        Self::Validation {
            message: format!("{} must not be empty", field),
            code: ErrorCode::ValMissingField,
            details,
            suggestion: Some(format!("Enter a {}", field)),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetConnectionFailed,
            source: None,
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetTimeout,
            source: None,
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            code: ErrorCode::AuthInvalidToken,
            source: None,
        }
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            code: ErrorCode::ResConflict,
        }
    }

    /// Create a not found error for a deck.
    pub fn deck_not_found(deck_id: impl Into<String>) -> Self {
        let id = deck_id.into();
        Self::NotFound {
            message: format!("Deck with id '{}' not found", id),
            code: ErrorCode::ResDeckNotFound,
            resource_id: Some(id),
        }
    }

    /// Create a not found error for a flashcard.
    pub fn card_not_found(card_id: impl Into<String>) -> Self {
        let id = card_id.into();
        Self::NotFound {
            message: format!("Flashcard with id '{}' not found", id),
            code: ErrorCode::ResCardNotFound,
            resource_id: Some(id),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
            code: ErrorCode::RevInvalidState,
        }
    }

    /// Create a pending mutation error.
    pub fn pending(card_id: CardId) -> Self {
        Self::Pending {
            card_id,
            code: ErrorCode::RevPendingMutation,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Authentication { code, .. } => *code,
            Self::Conflict { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::InvalidState { code, .. } => *code,
            Self::Pending { code, .. } => *code,
            Self::Api { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Network { .. } => Some("Check your connection and try again"),
            Self::Authentication { .. } => Some("Please log in again"),
            Self::Conflict { .. } => Some("Choose a different value and try again"),
            Self::NotFound { .. } => Some("The item was removed elsewhere; the list has been refreshed"),
            Self::Pending { .. } => Some("Wait for the previous change to finish"),
            _ => None,
        }
    }

    /// Whether the server reported the target as gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the caller needs to re-authenticate.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Whether the error was raised locally before any request went out.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation {
                code: ErrorCode::ValInvalidInput | ErrorCode::ValMissingField | ErrorCode::ValInvalidFormat,
                ..
            } | Self::InvalidState { .. }
                | Self::Pending { .. }
        )
    }

    /// Convert from an HTTP status code and response body.
    ///
    /// JSON bodies of the form `{"error": "..."}` contribute their message;
    /// anything else is used verbatim.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| format!("HTTP {}", status));
        match status {
            422 if is_token_rejection(body) => Self::Authentication {
                message,
                code: ErrorCode::AuthInvalidToken,
                source: None,
            },
            400 | 422 => Self::Validation {
                message,
                code: ErrorCode::ValRejectedByServer,
                details: HashMap::new(),
                suggestion: Some("Please check your input".to_string()),
            },
            401 => Self::Authentication {
                message,
                code: ErrorCode::AuthInvalidToken,
                source: None,
            },
            403 => Self::Authentication {
                message,
                code: ErrorCode::AuthForbidden,
                source: None,
            },
            404 => Self::NotFound {
                message,
                code: ErrorCode::ResNotFound,
                resource_id: None,
            },
            409 => Self::Conflict {
                message,
                code: ErrorCode::ResConflict,
            },
            _ => Self::Api {
                status,
                message,
                code: ErrorCode::NetUnexpectedStatus,
            },
        }
    }
}

/// The JWT layer answers a malformed or badly signed token with 422 and a
/// `{"msg": ...}` body; route handlers use `{"error": ...}` instead.
fn is_token_rejection(body: &str) -> bool {
    match serde_json::from_str::<serde_json::Value>(body.trim()) {
        Ok(serde_json::Value::Object(map)) => map.contains_key("msg") && !map.contains_key("error"),
        _ => false,
    }
}

fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => value
            .get("error")
            .or_else(|| value.get("message"))
            .or_else(|| value.get("msg"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}
