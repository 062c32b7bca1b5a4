use reqwest::Method;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::api::{self, eq, Backend};
use crate::error::Result;
use crate::model::{Fetched, MatchPlayer, RegistrationRow};

const PLAYERS_RPC: &str = "get_match_players";
const REGISTRATIONS_TABLE: &str = "match_registrations";

/// Registered participants of a match.
///
/// The players RPC joins profile data. When it is unavailable the registrations
/// table is read directly and display records are synthesised with placeholder
/// names; if that also fails the list is empty. Both degraded paths are tagged
/// [`Fetched::Fallback`].
#[instrument(skip(backend, token))]
pub(crate) async fn list_players(
    backend: &Backend,
    token: Option<&str>,
    match_id: &str,
) -> Fetched<Vec<MatchPlayer>> {
    match request_players(backend, token, match_id).await {
        Ok(players) => {
            debug!(count = players.len(), "fetched match players");
            return Fetched::Live(players);
        }
        Err(e) => warn!(error = %e, "players rpc unavailable, reading registrations"),
    }

    match request_registrations(backend, token, match_id).await {
        Ok(rows) => Fetched::Fallback(
            rows.into_iter()
                .enumerate()
                .map(|(index, row)| MatchPlayer::placeholder(index + 1, row))
                .collect(),
        ),
        Err(e) => {
            warn!(error = %e, "registrations unavailable, returning empty player list");
            Fetched::Fallback(Vec::new())
        }
    }
}

async fn request_players(
    backend: &Backend,
    token: Option<&str>,
    match_id: &str,
) -> Result<Vec<MatchPlayer>> {
    let url = backend.rpc_url(PLAYERS_RPC)?;
    let builder = backend
        .request(Method::POST, url.clone(), token)
        .json(&json!({ "match_id": match_id }));
    api::send_json(builder, &url).await
}

async fn request_registrations(
    backend: &Backend,
    token: Option<&str>,
    match_id: &str,
) -> Result<Vec<RegistrationRow>> {
    let mut url = backend.table_url(REGISTRATIONS_TABLE)?;
    url.query_pairs_mut()
        .append_pair("select", "user_id,registration_date,position,payment_status")
        .append_pair("match_id", &eq(match_id));
    api::send_json(backend.request(Method::GET, url.clone(), token), &url).await
}
