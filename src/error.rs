//! Error types for The Operator.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=auth, 3=not_found, 4=validation, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use thiserror::Error;

/// Result type alias for planner operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Auth (exit 2)
    NotAuthenticated,
    AuthFailed,

    // Not Found (exit 3)
    TaskNotFound,
    GoalNotFound,
    BlockNotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Sync (exit 6)
    BackendError,
    NetworkError,
    DatabaseError,
    Unsupported,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Payment (exit 9)
    PaymentError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::AuthFailed => "AUTH_FAILED",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::GoalNotFound => "GOAL_NOT_FOUND",
            Self::BlockNotFound => "BLOCK_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::BackendError => "BACKEND_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::Unsupported => "UNSUPPORTED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::PaymentError => "PAYMENT_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotAuthenticated | Self::AuthFailed => 2,
            Self::TaskNotFound | Self::GoalNotFound | Self::BlockNotFound => 3,
            Self::InvalidArgument => 4,
            Self::BackendError | Self::NetworkError | Self::DatabaseError | Self::Unsupported => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::PaymentError => 9,
        }
    }

    /// Whether resubmitting (possibly with corrected input) can succeed.
    ///
    /// Nothing is retried automatically; this only informs the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument | Self::NetworkError | Self::PaymentError | Self::AuthFailed
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in planner operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Task not found: {id}")]
    TaskNotFound { id: String },

    #[error("Goal not found: {id}")]
    GoalNotFound { id: String },

    #[error("Time block not found: {id}")]
    BlockNotFound { id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not supported by this backend: {0}")]
    Unsupported(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::Network(e.to_string())
        } else {
            Self::Backend(e.to_string())
        }
    }
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotAuthenticated => ErrorCode::NotAuthenticated,
            Self::Auth(_) => ErrorCode::AuthFailed,
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::GoalNotFound { .. } => ErrorCode::GoalNotFound,
            Self::BlockNotFound { .. } => ErrorCode::BlockNotFound,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Backend(_) => ErrorCode::BackendError,
            Self::Network(_) => ErrorCode::NetworkError,
            Self::Unsupported(_) => ErrorCode::Unsupported,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Payment(_) => ErrorCode::PaymentError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Whether the error came from the transport rather than the service.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotAuthenticated => Some(
                "Sign in first:\n  \
                 op --backend-url <url> auth sign-in you@example.com"
                    .to_string(),
            ),

            Self::TaskNotFound { id } => Some(format!(
                "No task with ID '{id}' in today's plan. Use `op task list` to see today's tasks."
            )),

            Self::GoalNotFound { id } => Some(format!(
                "No goal with ID '{id}'. Use `op goal list` to see your goals."
            )),

            Self::BlockNotFound { id } => Some(format!(
                "No time block with ID '{id}'. Use `op block list` to see today's schedule."
            )),

            Self::Config(msg) if msg.contains("backend") => Some(
                "Set a backend with OPERATOR_BACKEND_URL (https://… or sqlite:<path>) \
                 or \"backendUrl\" in ~/.operator/config.json"
                    .to_string(),
            ),

            Self::InvalidArgument(msg) => {
                if msg.contains("priority") {
                    Some("Valid tiers: 80, 60, 20. Synonyms: high→80, medium→60, low→20".to_string())
                } else if msg.contains("goal type") {
                    Some("Valid goal types: annual, quarterly. Synonyms: year→annual, q→quarterly".to_string())
                } else if msg.contains("time") {
                    Some("Times are 24-hour HH:MM, e.g. 09:30 or 17:00".to_string())
                } else {
                    None
                }
            }

            Self::Network(_) => {
                Some("Check your connection; nothing is retried automatically.".to_string())
            }

            Self::Auth(_)
            | Self::Backend(_)
            | Self::Unsupported(_)
            | Self::Database(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Payment(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
