use chrono::NaiveDate;
use futures::future::join_all;
use itertools::Itertools;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::api::{self, eq, Backend};
use crate::error::Result;
use crate::model::{Fetched, Match, MatchList, MatchStats, MatchStatus, MatchWithStats, StatsPayload};

const MATCHES_TABLE: &str = "matches";
const STATS_RPC: &str = "get_match_stats";
const MATCH_DATE_FORMAT: &str = "%Y-%m-%d";

/// Active matches scheduled on or after `from`, soonest first, each with its stats.
#[instrument(skip(backend, token))]
pub(crate) async fn list_active_matches(
    backend: &Backend,
    token: Option<&str>,
    from: NaiveDate,
) -> Result<MatchList> {
    let mut url = backend.table_url(MATCHES_TABLE)?;
    url.query_pairs_mut()
        .append_pair("select", "*")
        .append_pair("status", &eq(&MatchStatus::Active.to_string()))
        .append_pair("match_date", &format!("gte.{}", from.format(MATCH_DATE_FORMAT)))
        .append_pair("order", "match_date.asc,match_time.asc");

    let matches: Vec<Match> =
        api::send_json(backend.request(Method::GET, url.clone(), token), &url).await?;
    debug!(count = matches.len(), "fetched active matches");

    let stats = join_all(matches.iter().map(|m| fetch_stats(backend, token, m))).await;

    Ok(matches
        .into_iter()
        .zip_eq(stats)
        .map(|(details, stats)| MatchWithStats { details, stats })
        .collect())
}

/// A single match with its stats, or `None` if no such match exists.
#[instrument(skip(backend, token))]
pub(crate) async fn get_match(
    backend: &Backend,
    token: Option<&str>,
    match_id: &str,
) -> Result<Option<MatchWithStats>> {
    let mut url = backend.table_url(MATCHES_TABLE)?;
    url.query_pairs_mut()
        .append_pair("select", "*")
        .append_pair("id", &eq(match_id))
        .append_pair("limit", "1");

    let rows: Vec<Match> =
        api::send_json(backend.request(Method::GET, url.clone(), token), &url).await?;
    let Some(details) = rows.into_iter().next() else {
        debug!(match_id, "match not found");
        return Ok(None);
    };

    let stats = fetch_stats(backend, token, &details).await;
    Ok(Some(MatchWithStats { details, stats }))
}

/// Stats for one match. A failed call degrades to an empty snapshot.
async fn fetch_stats(backend: &Backend, token: Option<&str>, m: &Match) -> Fetched<MatchStats> {
    match request_stats(backend, token, &m.id).await {
        Ok(Some(stats)) => Fetched::Live(stats),
        Ok(None) => {
            warn!(match_id = %m.id, "stats call returned no rows, using empty snapshot");
            Fetched::Fallback(MatchStats::empty_for(m))
        }
        Err(e) => {
            warn!(match_id = %m.id, error = %e, "stats unavailable, using empty snapshot");
            Fetched::Fallback(MatchStats::empty_for(m))
        }
    }
}

async fn request_stats(
    backend: &Backend,
    token: Option<&str>,
    match_id: &str,
) -> Result<Option<MatchStats>> {
    let url = backend.rpc_url(STATS_RPC)?;
    let builder = backend
        .request(Method::POST, url.clone(), token)
        .json(&json!({ "match_uuid": match_id }));
    let payload: StatsPayload = api::send_json(builder, &url).await?;
    Ok(payload.into_stats())
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use super::*;
    use crate::test_support::{client_for, match_row, stats_row, ANON_KEY};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[tokio::test]
    async fn lists_active_matches_with_filters_and_stats() {
        let mut server = Server::new_async().await;
        let client = client_for(&server);

        let list = server
            .mock("GET", "/rest/v1/matches")
            .match_header("apikey", ANON_KEY)
            .match_header("authorization", format!("Bearer {ANON_KEY}").as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("status".into(), "eq.active".into()),
                Matcher::UrlEncoded("match_date".into(), "gte.2026-10-19".into()),
                Matcher::UrlEncoded("order".into(), "match_date.asc,match_time.asc".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_string(&vec![match_row("m1", 10, 2), match_row("m2", 14, 2)]).unwrap())
            .expect(1)
            .create_async()
            .await;
        let stats_m1 = server
            .mock("POST", "/rest/v1/rpc/get_match_stats")
            .match_body(Matcher::Json(json!({ "match_uuid": "m1" })))
            .with_body(stats_row(4, 10, 1, 2).to_string())
            .expect(1)
            .create_async()
            .await;
        let stats_m2 = server
            .mock("POST", "/rest/v1/rpc/get_match_stats")
            .match_body(Matcher::Json(json!({ "match_uuid": "m2" })))
            .with_body(format!("[{}]", stats_row(0, 14, 0, 2)))
            .expect(1)
            .create_async()
            .await;

        let matches = list_active_matches(client.backend(), None, today()).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].details.id, "m1");
        assert_eq!(matches[0].stats, Fetched::Live(serde_json::from_value(stats_row(4, 10, 1, 2)).unwrap()));
        assert_eq!(matches[1].stats.value().available_player_spots, 14);
        assert!(!matches[1].stats.is_fallback());

        list.assert_async().await;
        stats_m1.assert_async().await;
        stats_m2.assert_async().await;
    }

    #[tokio::test]
    async fn isolates_stats_failure_to_its_match() {
        let mut server = Server::new_async().await;
        let client = client_for(&server);

        let _list = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::Any)
            .with_body(serde_json::to_string(&vec![match_row("m1", 10, 2), match_row("m2", 12, 1)]).unwrap())
            .create_async()
            .await;
        let _ok = server
            .mock("POST", "/rest/v1/rpc/get_match_stats")
            .match_body(Matcher::Json(json!({ "match_uuid": "m1" })))
            .with_body(stats_row(3, 10, 0, 2).to_string())
            .create_async()
            .await;
        let _broken = server
            .mock("POST", "/rest/v1/rpc/get_match_stats")
            .match_body(Matcher::Json(json!({ "match_uuid": "m2" })))
            .with_status(500)
            .with_body(r#"{"code":"XX000","message":"function failed"}"#)
            .create_async()
            .await;

        let matches = list_active_matches(client.backend(), None, today()).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert!(!matches[0].stats.is_fallback());
        assert_eq!(matches[0].stats.value().total_players, 3);

        let fallback = &matches[1].stats;
        assert!(fallback.is_fallback());
        assert_eq!(fallback.value().total_players, 0);
        assert_eq!(fallback.value().available_player_spots, 12);
        assert_eq!(fallback.value().available_goalkeeper_spots, 1);
        assert!(!fallback.value().is_full);
    }

    #[tokio::test]
    async fn list_query_failure_is_an_error() {
        let mut server = Server::new_async().await;
        let client = client_for(&server);

        let _list = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("service unavailable")
            .create_async()
            .await;

        let err = list_active_matches(client.backend(), None, today()).await.unwrap_err();
        assert!(matches!(
            err,
            crate::KrewbiError::Backend { status, .. } if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn get_match_returns_none_when_missing() {
        let mut server = Server::new_async().await;
        let client = client_for(&server);

        let _lookup = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.ghost".into()))
            .with_body("[]")
            .create_async()
            .await;
        let stats = server
            .mock("POST", "/rest/v1/rpc/get_match_stats")
            .expect(0)
            .create_async()
            .await;

        assert!(get_match(client.backend(), None, "ghost").await.unwrap().is_none());
        stats.assert_async().await;
    }

    #[tokio::test]
    async fn get_match_falls_back_on_stats_failure() {
        let mut server = Server::new_async().await;
        let client = client_for(&server);

        let _lookup = server
            .mock("GET", "/rest/v1/matches")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.m1".into()))
            .with_body(serde_json::to_string(&vec![match_row("m1", 10, 2)]).unwrap())
            .create_async()
            .await;
        let _stats = server
            .mock("POST", "/rest/v1/rpc/get_match_stats")
            .with_status(404)
            .with_body(r#"{"code":"PGRST202","message":"Could not find the function"}"#)
            .create_async()
            .await;

        let found = get_match(client.backend(), None, "m1").await.unwrap().unwrap();
        assert_eq!(found.details.max_players, 10);
        assert_eq!(found.stats, Fetched::Fallback(MatchStats::empty_for(&found.details)));
    }
}
