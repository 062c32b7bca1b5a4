//! Landing logic for links coming back from the auth service (OAuth sign-in,
//! email confirmation, password recovery).

use tracing::{error, instrument};
use url::Url;

use crate::client::KrewbiClient;
use crate::route::Route;

/// Query parameters the auth service appends to callback links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    /// `recovery`, `signup`, ...
    pub kind: Option<String>,
    /// App-relative path to continue to.
    pub next: Option<String>,
}

impl CallbackParams {
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "type" => params.kind = Some(value.into_owned()),
                "next" => params.next = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

/// Exchange the callback code (if any) and decide where to go next.
///
/// A failed exchange lands on the sign-in page with the error message. Otherwise
/// recovery links continue to `next` or the reset page, sign-up confirmations
/// to the success page, and everything else to the home page.
#[instrument(skip(client, code_verifier))]
pub async fn resolve_callback(
    client: &KrewbiClient,
    params: &CallbackParams,
    code_verifier: Option<&str>,
) -> Route {
    if let Some(code) = params.code.as_deref() {
        if let Err(e) = client
            .exchange_code_for_session(code, code_verifier.unwrap_or_default())
            .await
        {
            error!(error = %e, "code exchange failed");
            let message = e
                .backend_message()
                .map(str::to_string)
                .unwrap_or_else(|| e.user_message());
            return Route::login_with_error(message);
        }
    }

    match params.kind.as_deref() {
        Some("recovery") => params
            .next
            .as_deref()
            .filter(|next| is_app_relative(next))
            .map(|next| Route::Path(next.to_string()))
            .unwrap_or(Route::ResetPassword),
        Some("signup") => Route::SignUpSuccess,
        _ => Route::Home,
    }
}

/// A path on this site. Browsers read `//host` and `/\host` as other hosts.
fn is_app_relative(path: &str) -> bool {
    path.starts_with('/') && !matches!(path.as_bytes().get(1), Some(b'/' | b'\\'))
}
