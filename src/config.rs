use url::Url;

/// Errors raised while building a [`ClientConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for environment variable {var}: {reason}")]
    InvalidEnvValue { var: String, reason: String },
}

/// Connection settings for the Krewbi backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the backend project, e.g. `https://project.supabase.co/`.
    pub api_url: Url,
    /// Public anonymous key sent with every request.
    pub anon_key: String,
    /// Public URL of the front end, used to build auth redirect targets.
    pub site_url: Url,
}

impl ClientConfig {
    pub fn new(api_url: Url, anon_key: impl Into<String>, site_url: Url) -> Self {
        Self {
            api_url: with_trailing_slash(api_url),
            anon_key: anon_key.into(),
            site_url: with_trailing_slash(site_url),
        }
    }

    /// Read `KREWBI_API_URL`, `KREWBI_ANON_KEY` and `KREWBI_SITE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = url_var("KREWBI_API_URL")?;
        let anon_key = var("KREWBI_ANON_KEY")?;
        let site_url = url_var("KREWBI_SITE_URL")?;
        Ok(Self::new(api_url, anon_key, site_url))
    }

    /// Absolute front-end URL for `path` (no leading slash), used as an auth redirect.
    pub fn site_redirect(&self, path: &str) -> Result<Url, url::ParseError> {
        self.site_url.join(path)
    }
}

fn var(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

fn url_var(name: &str) -> Result<Url, ConfigError> {
    let raw = var(name)?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvValue {
        var: name.to_string(),
        reason: e.to_string(),
    })
}

// `Url::join` replaces the last segment unless the base ends with a slash.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
