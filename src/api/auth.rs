use rand::distr::{Alphanumeric, SampleString};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use crate::api::{self, Backend};
use crate::error::Result;
use crate::model::{
    OAuthProvider, OAuthRedirect, ProfileUpdate, Session, SignUpOutcome, SignUpRequest, User,
};

const CALLBACK_PATH: &str = "auth/callback";
const RESET_PASSWORD_PATH: &str = "auth/reset-password";
const CODE_VERIFIER_LEN: usize = 64;

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Serialize)]
struct SignUpData<'a> {
    full_name: Option<&'a str>,
    phone_number: Option<&'a str>,
}

/// Sign-up answers with a session when confirmation is off, a bare user otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpPayload {
    Session(Session),
    User(User),
}

fn token_url(backend: &Backend, grant_type: &str) -> Result<Url> {
    let mut url = backend.auth_url("token")?;
    url.query_pairs_mut().append_pair("grant_type", grant_type);
    Ok(url)
}

fn with_redirect(mut url: Url, backend: &Backend, path: &str) -> Result<Url> {
    let redirect = backend.config().site_redirect(path)?;
    url.query_pairs_mut().append_pair("redirect_to", redirect.as_str());
    Ok(url)
}

async fn post_token<B: Serialize>(backend: &Backend, grant_type: &str, body: &B) -> Result<Session> {
    let url = token_url(backend, grant_type)?;
    let builder = backend.request(Method::POST, url.clone(), None).json(body);
    api::send_json(builder, &url).await
}

#[instrument(skip(backend, token))]
pub(crate) async fn get_user(backend: &Backend, token: &str) -> Result<User> {
    let url = backend.auth_url("user")?;
    api::send_json(backend.request(Method::GET, url.clone(), Some(token)), &url).await
}

#[instrument(skip(backend, password))]
pub(crate) async fn sign_in_with_password(
    backend: &Backend,
    email: &str,
    password: &str,
) -> Result<Session> {
    post_token(backend, "password", &json!({ "email": email, "password": password })).await
}

#[instrument(skip_all)]
pub(crate) async fn refresh(backend: &Backend, refresh_token: &str) -> Result<Session> {
    post_token(backend, "refresh_token", &json!({ "refresh_token": refresh_token })).await
}

#[instrument(skip_all)]
pub(crate) async fn exchange_code(
    backend: &Backend,
    code: &str,
    code_verifier: &str,
) -> Result<Session> {
    post_token(
        backend,
        "pkce",
        &json!({ "auth_code": code, "code_verifier": code_verifier }),
    )
    .await
}

#[instrument(skip(backend, request), fields(email = %request.email))]
pub(crate) async fn sign_up(backend: &Backend, request: &SignUpRequest) -> Result<SignUpOutcome> {
    let url = with_redirect(backend.auth_url("signup")?, backend, CALLBACK_PATH)?;
    let builder = backend.request(Method::POST, url.clone(), None).json(&SignUpBody {
        email: &request.email,
        password: &request.password,
        data: SignUpData {
            full_name: request.full_name.as_deref(),
            phone_number: request.phone_number.as_deref(),
        },
    });

    Ok(match api::send_json(builder, &url).await? {
        SignUpPayload::Session(session) => SignUpOutcome::SignedIn(session),
        SignUpPayload::User(user) => {
            debug!(user_id = %user.id, "sign-up awaiting email confirmation");
            SignUpOutcome::ConfirmationRequired(user)
        }
    })
}

#[instrument(skip_all)]
pub(crate) async fn sign_out(backend: &Backend, token: &str) -> Result<()> {
    let url = backend.auth_url("logout")?;
    api::send(backend.request(Method::POST, url.clone(), Some(token)), &url).await?;
    Ok(())
}

#[instrument(skip(backend))]
pub(crate) async fn reset_password(backend: &Backend, email: &str) -> Result<()> {
    let url = with_redirect(backend.auth_url("recover")?, backend, RESET_PASSWORD_PATH)?;
    let builder = backend
        .request(Method::POST, url.clone(), None)
        .json(&json!({ "email": email }));
    api::send(builder, &url).await?;
    Ok(())
}

#[instrument(skip_all)]
pub(crate) async fn update_password(backend: &Backend, token: &str, password: &str) -> Result<User> {
    let url = backend.auth_url("user")?;
    let builder = backend
        .request(Method::PUT, url.clone(), Some(token))
        .json(&json!({ "password": password }));
    api::send_json(builder, &url).await
}

#[instrument(skip(backend, token))]
pub(crate) async fn update_profile(
    backend: &Backend,
    token: &str,
    profile: &ProfileUpdate,
) -> Result<User> {
    let url = backend.auth_url("user")?;
    let builder = backend
        .request(Method::PUT, url.clone(), Some(token))
        .json(&json!({ "data": profile }));
    api::send_json(builder, &url).await
}

#[instrument(skip(backend))]
pub(crate) async fn resend_confirmation(backend: &Backend, email: &str) -> Result<()> {
    let url = with_redirect(backend.auth_url("resend")?, backend, CALLBACK_PATH)?;
    let builder = backend
        .request(Method::POST, url.clone(), None)
        .json(&json!({ "type": "signup", "email": email }));
    api::send(builder, &url).await?;
    Ok(())
}

/// Build the provider redirect. No request is made; the browser follows the URL
/// and comes back to the site root with a `code` to exchange.
pub(crate) fn authorize(backend: &Backend, provider: OAuthProvider) -> Result<OAuthRedirect> {
    let code_verifier = Alphanumeric.sample_string(&mut rand::rng(), CODE_VERIFIER_LEN);
    let mut url = with_redirect(backend.auth_url("authorize")?, backend, "")?;
    url.query_pairs_mut()
        .append_pair("provider", &provider.to_string())
        .append_pair("code_challenge", &code_verifier)
        .append_pair("code_challenge_method", "plain");
    Ok(OAuthRedirect { url, code_verifier })
}
