use std::fmt;

/// Front-end locations the client may ask the UI to navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login { error: Option<String> },
    SignUp,
    SignUpSuccess,
    ForgotPassword,
    ResetPassword,
    MatchDetail(String),
    Profile,
    ProfileEdit,
    /// An app-relative path taken verbatim, e.g. a `next` parameter.
    Path(String),
}

impl Route {
    pub fn login() -> Self {
        Route::Login { error: None }
    }

    pub fn login_with_error(message: impl Into<String>) -> Self {
        Route::Login {
            error: Some(message.into()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("/"),
            Route::Login { error: None } => f.write_str("/login"),
            Route::Login { error: Some(error) } => {
                write!(f, "/login?error={}", urlencoding::encode(error))
            }
            Route::SignUp => f.write_str("/signup"),
            Route::SignUpSuccess => f.write_str("/signup/success"),
            Route::ForgotPassword => f.write_str("/forgot-password"),
            Route::ResetPassword => f.write_str("/auth/reset-password"),
            Route::MatchDetail(id) => write!(f, "/partidos/{}", urlencoding::encode(id)),
            Route::Profile => f.write_str("/perfil"),
            Route::ProfileEdit => f.write_str("/perfil/editar"),
            Route::Path(path) => f.write_str(path),
        }
    }
}
