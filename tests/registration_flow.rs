mod common;

use common::*;
use krewbi::{KrewbiError, MatchDetailView, Notice, Position, Route, ViewState};
use mockito::{Matcher, Server};
use serde_json::json;

#[tokio::test]
async fn register_then_refresh_shows_the_new_registration() {
    let mut server = Server::new_async().await;
    let (client, auth) = signed_in(&server, "u-1");

    let _match = mock_match(&mut server, 10, 2).await;
    let before = mock_stats(&mut server, stats_row(3, 10, 1, 2)).await;
    let no_players = mock_players(&mut server, json!([])).await;
    let not_registered = mock_registered(&mut server, "u-1", false).await;

    let view = MatchDetailView::new(client.clone(), auth, MATCH_ID);
    assert_eq!(view.load().await.notice, None);
    assert_eq!(view.state(), ViewState::Ready { registered: false });
    assert!(view.available_actions().register_player);

    before.remove_async().await;
    no_players.remove_async().await;
    not_registered.remove_async().await;

    let insert = server
        .mock("POST", "/rest/v1/match_registrations")
        .match_header("authorization", "Bearer token-u-1")
        .match_body(Matcher::Json(json!({
            "match_id": MATCH_ID,
            "user_id": "u-1",
            "position": "player"
        })))
        .with_status(201)
        .expect(1)
        .create_async()
        .await;
    let _after = mock_stats(&mut server, stats_row(4, 10, 1, 2)).await;
    let _players = mock_players(&mut server, json!([player_row("u-1", "Ana Rojas")])).await;
    let _registered = mock_registered(&mut server, "u-1", true).await;

    let outcome = view.register(Position::Player).await;

    assert_eq!(outcome.notice, Some(Notice::Success("You are registered!".into())));
    assert_eq!(view.state(), ViewState::Ready { registered: true });
    assert!(!view.is_registering());

    let details = view.details().unwrap();
    assert_eq!(details.stats.value().total_players, 4);
    assert_eq!(details.stats.value().available_player_spots, 6);
    assert_eq!(view.players().value().len(), 1);
    assert!(client.is_registered(MATCH_ID).await);

    let actions = view.available_actions();
    assert!(actions.cancel);
    assert!(!actions.register_player);

    insert.assert_async().await;
}

#[tokio::test]
async fn unregister_then_refresh_clears_the_registration() {
    let mut server = Server::new_async().await;
    let (client, auth) = signed_in(&server, "u-1");

    let _match = mock_match(&mut server, 10, 2).await;
    let before = mock_stats(&mut server, stats_row(4, 10, 1, 2)).await;
    let _players = mock_players(&mut server, json!([])).await;
    let registered = mock_registered(&mut server, "u-1", true).await;

    let view = MatchDetailView::new(client.clone(), auth, MATCH_ID);
    view.load().await;
    assert_eq!(view.state(), ViewState::Ready { registered: true });

    before.remove_async().await;
    registered.remove_async().await;

    let delete = server
        .mock("DELETE", "/rest/v1/match_registrations")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("match_id".into(), format!("eq.{MATCH_ID}")),
            Matcher::UrlEncoded("user_id".into(), "eq.u-1".into()),
        ]))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let _after = mock_stats(&mut server, stats_row(3, 10, 1, 2)).await;
    let _not_registered = mock_registered(&mut server, "u-1", false).await;

    let outcome = view.unregister().await;

    assert_eq!(outcome.notice, Some(Notice::Success("Registration cancelled".into())));
    assert_eq!(view.state(), ViewState::Ready { registered: false });
    assert_eq!(view.details().unwrap().stats.value().total_players, 3);
    assert!(!client.is_registered(MATCH_ID).await);

    delete.assert_async().await;
}

#[tokio::test]
async fn second_registration_is_reported_as_already_registered() {
    let mut server = Server::new_async().await;
    let (client, _) = signed_in(&server, "u-1");

    let _insert = server
        .mock("POST", "/rest/v1/match_registrations")
        .with_status(409)
        .with_body(
            json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"match_registrations_match_id_user_id_key\""
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = client.register(MATCH_ID, Position::Player).await.unwrap_err();

    assert!(matches!(err, KrewbiError::AlreadyRegistered));
    assert_eq!(err.user_message(), "You are already registered for this match");
}

#[tokio::test]
async fn last_spot_goes_to_the_first_registration() {
    let mut server = Server::new_async().await;
    let (client_a, auth_a) = signed_in(&server, "u-a");
    let (client_b, auth_b) = signed_in(&server, "u-b");

    let _match = mock_match(&mut server, 10, 2).await;
    let one_left = mock_stats(&mut server, stats_row(9, 10, 2, 2)).await;
    let _players = mock_players(&mut server, json!([])).await;
    let _a_registered = mock_registered(&mut server, "u-a", false).await;
    let _b_registered = mock_registered(&mut server, "u-b", false).await;

    let view_a = MatchDetailView::new(client_a, auth_a, MATCH_ID);
    let view_b = MatchDetailView::new(client_b, auth_b, MATCH_ID);
    view_a.load().await;
    view_b.load().await;
    assert!(view_a.available_actions().register_player);
    assert!(view_b.available_actions().register_player);

    one_left.remove_async().await;
    let _full = mock_stats(&mut server, stats_row(10, 10, 2, 2)).await;

    let insert_a = server
        .mock("POST", "/rest/v1/match_registrations")
        .match_header("authorization", "Bearer token-u-a")
        .with_status(201)
        .expect(1)
        .create_async()
        .await;
    let insert_b = server
        .mock("POST", "/rest/v1/match_registrations")
        .match_header("authorization", "Bearer token-u-b")
        .with_status(400)
        .with_body(json!({ "code": "P0001", "message": "Match is full" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let outcome_a = view_a.register(Position::Player).await;
    assert!(!outcome_a.is_error());
    assert!(view_a.details().unwrap().stats.value().is_full);

    // B still sees the stale spot and reaches the backend, which refuses.
    let outcome_b = view_b.register(Position::Player).await;
    assert_eq!(outcome_b.notice, Some(Notice::Error("Match is full".into())));
    assert_eq!(view_b.state(), ViewState::Ready { registered: false });
    assert!(!view_b.is_registering());

    insert_a.assert_async().await;
    insert_b.assert_async().await;
}

#[tokio::test]
async fn anonymous_viewer_is_sent_to_login_without_a_request() {
    let mut server = Server::new_async().await;
    let (client, auth) = anonymous(&server);

    let _match = mock_match(&mut server, 10, 2).await;
    let _stats = mock_stats(&mut server, stats_row(0, 10, 0, 2)).await;
    let _players = mock_players(&mut server, json!([])).await;
    let registered = server
        .mock("GET", "/rest/v1/match_registrations")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let insert = server
        .mock("POST", "/rest/v1/match_registrations")
        .expect(0)
        .create_async()
        .await;

    let view = MatchDetailView::new(client, auth, MATCH_ID);
    view.load().await;
    assert_eq!(view.state(), ViewState::Ready { registered: false });

    let outcome = view.register(Position::Goalkeeper).await;

    assert!(outcome.is_error());
    assert_eq!(outcome.redirect, Some(Route::login()));
    registered.assert_async().await;
    insert.assert_async().await;
}

#[tokio::test]
async fn listing_degrades_per_match_when_stats_fail() {
    let mut server = Server::new_async().await;
    let client = client_for(&server);

    let _list = server
        .mock("GET", "/rest/v1/matches")
        .match_query(Matcher::UrlEncoded("status".into(), "eq.active".into()))
        .with_body(json!([match_row("m-1", 10, 2), match_row("m-2", 14, 2)]).to_string())
        .create_async()
        .await;
    let _ok = server
        .mock("POST", "/rest/v1/rpc/get_match_stats")
        .match_body(Matcher::Json(json!({ "match_uuid": "m-1" })))
        .with_body(stats_row(2, 10, 1, 2).to_string())
        .create_async()
        .await;
    let _broken = server
        .mock("POST", "/rest/v1/rpc/get_match_stats")
        .match_body(Matcher::Json(json!({ "match_uuid": "m-2" })))
        .with_status(500)
        .with_body(r#"{"message":"function get_match_stats does not exist"}"#)
        .create_async()
        .await;

    let matches = client
        .list_active_matches_from(chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
        .await
        .unwrap();

    assert_eq!(matches.len(), 2);
    assert!(!matches[0].stats.is_fallback());
    assert_eq!(matches[0].stats.value().total_players, 2);

    let fallback = &matches[1].stats;
    assert!(fallback.is_fallback());
    assert_eq!(fallback.value().total_players, 0);
    assert_eq!(fallback.value().available_player_spots, 14);
    assert_eq!(fallback.value().available_goalkeeper_spots, 2);
    assert!(!fallback.value().is_full);
}
