use reqwest::Method;
use serde::de::IgnoredAny;
use tracing::{debug, instrument};

use crate::api::{self, eq, Backend};
use crate::error::{KrewbiError, Result};
use crate::model::{NewRegistration, Position, Session};

const REGISTRATIONS_TABLE: &str = "match_registrations";
const REGISTER_FAILED: &str = "Could not register for the match";
const UNREGISTER_FAILED: &str = "Could not cancel the registration";

/// Insert a registration for the session's user.
///
/// Capacity and uniqueness are enforced by the backend; a uniqueness conflict
/// maps to [`KrewbiError::AlreadyRegistered`].
#[instrument(skip(backend, session), fields(user_id = %session.user.id))]
pub(crate) async fn insert(
    backend: &Backend,
    session: &Session,
    match_id: &str,
    position: Position,
) -> Result<()> {
    let url = backend.table_url(REGISTRATIONS_TABLE)?;
    let builder = backend
        .request(Method::POST, url.clone(), Some(&session.access_token))
        .header("Prefer", "return=minimal")
        .json(&NewRegistration {
            match_id,
            user_id: &session.user.id,
            position,
        });

    match api::send(builder, &url).await {
        Ok(_) => {
            debug!("registration created");
            Ok(())
        }
        Err(e) if e.is_unique_violation() => Err(KrewbiError::AlreadyRegistered),
        Err(e @ KrewbiError::Backend { .. }) => Err(KrewbiError::RegistrationFailed {
            reason: rejection_reason(&e, REGISTER_FAILED),
        }),
        Err(e) => Err(e),
    }
}

/// Delete the session user's registration. Deleting nothing is not an error.
#[instrument(skip(backend, session), fields(user_id = %session.user.id))]
pub(crate) async fn delete(backend: &Backend, session: &Session, match_id: &str) -> Result<()> {
    let mut url = backend.table_url(REGISTRATIONS_TABLE)?;
    url.query_pairs_mut()
        .append_pair("match_id", &eq(match_id))
        .append_pair("user_id", &eq(&session.user.id));
    let builder = backend.request(Method::DELETE, url.clone(), Some(&session.access_token));

    match api::send(builder, &url).await {
        Ok(_) => {
            debug!("registration deleted");
            Ok(())
        }
        Err(e @ KrewbiError::Backend { .. }) => Err(KrewbiError::UnregistrationFailed {
            reason: rejection_reason(&e, UNREGISTER_FAILED),
        }),
        Err(e) => Err(e),
    }
}

/// Whether the session user holds a registration for the match.
#[instrument(skip(backend, session), fields(user_id = %session.user.id))]
pub(crate) async fn exists(backend: &Backend, session: &Session, match_id: &str) -> Result<bool> {
    let mut url = backend.table_url(REGISTRATIONS_TABLE)?;
    url.query_pairs_mut()
        .append_pair("select", "id")
        .append_pair("match_id", &eq(match_id))
        .append_pair("user_id", &eq(&session.user.id))
        .append_pair("limit", "1");
    let builder = backend.request(Method::GET, url.clone(), Some(&session.access_token));

    let rows: Vec<IgnoredAny> = api::send_json(builder, &url).await?;
    Ok(!rows.is_empty())
}

fn rejection_reason(err: &KrewbiError, generic: &str) -> String {
    err.backend_message()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(generic)
        .to_string()
}
