use serde::Deserialize;
use serde_json::Value;

use crate::config::ConfigError;

/// Postgres `unique_violation`, returned when a (user, match) registration already exists.
const UNIQUE_VIOLATION: &str = "23505";

/// All errors that can occur while talking to the Krewbi backend.
#[derive(thiserror::Error, Debug)]
pub enum KrewbiError {
    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// Backend answered with a non-success status code.
    #[error("backend rejected request to {url} with status {status}: {error}")]
    Backend {
        url: String,
        status: reqwest::StatusCode,
        error: BackendError,
    },

    /// Failed to read or decode the response body.
    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        source: reqwest::Error,
    },

    /// The operation needs a signed-in user and there is none.
    #[error("no authenticated user")]
    Unauthenticated,

    /// The user already holds a registration for this match.
    #[error("already registered for this match")]
    AlreadyRegistered,

    /// The backend refused the registration insert.
    #[error("registration failed: {reason}")]
    RegistrationFailed { reason: String },

    /// The backend refused the registration delete.
    #[error("unregistration failed: {reason}")]
    UnregistrationFailed { reason: String },

    /// The referenced match does not exist.
    #[error("match {match_id} not found")]
    NotFound { match_id: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A request URL could not be built from the configured base URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl KrewbiError {
    /// Whether the backend reported a uniqueness conflict.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            KrewbiError::Backend { error, .. } if error.code.as_deref() == Some(UNIQUE_VIOLATION)
        )
    }

    /// The backend's own message, if this error came from a backend rejection.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            KrewbiError::Backend { error, .. } => Some(&error.message),
            _ => None,
        }
    }

    /// Text suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            KrewbiError::Unauthenticated => "You must sign in to continue".to_string(),
            KrewbiError::AlreadyRegistered => {
                "You are already registered for this match".to_string()
            }
            KrewbiError::RegistrationFailed { reason }
            | KrewbiError::UnregistrationFailed { reason } => reason.clone(),
            KrewbiError::NotFound { .. } => "Match not found".to_string(),
            _ => "Unexpected error, please try again".to_string(),
        }
    }
}

/// Error payload returned by the backend, normalized across the REST and auth surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub code: Option<String>,
    pub message: String,
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawBackendError {
    code: Option<Value>,
    error_code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl BackendError {
    /// Parse an error body. REST errors carry `{code, message}`, auth errors carry
    /// `{error_code, msg}` or `{error, error_description}`; anything else keeps the raw text.
    pub(crate) fn from_body(body: &str) -> Self {
        let raw: RawBackendError = serde_json::from_str(body).unwrap_or_default();

        let code = raw.error_code.or(match raw.code {
            Some(Value::String(code)) => Some(code),
            Some(Value::Number(code)) => Some(code.to_string()),
            _ => None,
        });

        let message = raw
            .message
            .or(raw.msg)
            .or(raw.error_description)
            .or(raw.error)
            .unwrap_or_else(|| body.trim().to_string());

        Self { code, message }
    }
}

pub type Result<T> = std::result::Result<T, KrewbiError>;
