use serde::{Deserialize, Serialize};

/// An authenticated account as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

impl User {
    /// Full name if set, then email, then the raw id.
    pub fn display_name(&self) -> &str {
        self.user_metadata
            .full_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Profile fields the user can edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppMetadata {
    /// `email`, `google`, ...
    #[serde(default)]
    pub provider: Option<String>,
}

/// Tokens issued by the auth service for a signed-in user.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

// Keep tokens out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Input for [`KrewbiClient::sign_up`](crate::KrewbiClient::sign_up).
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
}

/// Profile fields sent to [`KrewbiClient::update_profile`](crate::KrewbiClient::update_profile).
/// They are stored in the user's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub phone_number: String,
}

/// Result of a sign-up call.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// Email confirmation is disabled and the user is signed in.
    SignedIn(Session),
    /// The account exists but must be confirmed from the emailed link.
    ConfirmationRequired(User),
}

/// Identity providers offered on the sign-in page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Apple,
}

/// Where to send the browser for an OAuth sign-in, plus the PKCE verifier
/// needed later to exchange the returned code.
#[derive(Debug, Clone)]
pub struct OAuthRedirect {
    pub url: url::Url,
    pub code_verifier: String,
}
