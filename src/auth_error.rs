use crate::error::KrewbiError;

/// Auth failures the sign-in and sign-up pages explain to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorKind {
    InvalidCredentials,
    EmailNotConfirmed,
    TooManyRequests,
    UserAlreadyRegistered,
    WeakPassword,
    InvalidEmail,
    /// Some other message from the auth service, kept verbatim.
    Other(String),
    /// No message at all.
    Unknown,
}

impl AuthErrorKind {
    /// Classify a message from the auth service. Matching is case-insensitive
    /// and by substring, since the service's wording varies between versions.
    pub fn classify(message: Option<&str>) -> Self {
        let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) else {
            return AuthErrorKind::Unknown;
        };
        let lower = message.to_lowercase();

        if lower.contains("invalid login credentials") || lower.contains("invalid email or password") {
            AuthErrorKind::InvalidCredentials
        } else if lower.contains("email not confirmed") || lower.contains("signup_disabled") {
            AuthErrorKind::EmailNotConfirmed
        } else if lower.contains("too many requests") {
            AuthErrorKind::TooManyRequests
        } else if lower.contains("user already registered") {
            AuthErrorKind::UserAlreadyRegistered
        } else if lower.contains("weak password") {
            AuthErrorKind::WeakPassword
        } else if lower.contains("invalid email") {
            AuthErrorKind::InvalidEmail
        } else {
            AuthErrorKind::Other(message.to_string())
        }
    }

    pub fn from_error(err: &KrewbiError) -> Self {
        Self::classify(err.backend_message())
    }

    pub fn user_message(&self) -> String {
        match self {
            AuthErrorKind::InvalidCredentials => {
                "Incorrect email or password. Check your details and try again.".to_string()
            }
            AuthErrorKind::EmailNotConfirmed => {
                "Your account is not confirmed yet. Check your email and confirm it before signing in.".to_string()
            }
            AuthErrorKind::TooManyRequests => {
                "Too many attempts. Wait a moment and try again.".to_string()
            }
            AuthErrorKind::UserAlreadyRegistered => {
                "This email is already registered. Sign in or use another email.".to_string()
            }
            AuthErrorKind::WeakPassword => {
                "The password is too weak. Use at least 6 characters with letters and numbers.".to_string()
            }
            AuthErrorKind::InvalidEmail => "The email format is not valid.".to_string(),
            AuthErrorKind::Other(message) => format!("Error: {message}"),
            AuthErrorKind::Unknown => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}
