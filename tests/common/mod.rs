use krewbi::{AuthState, ClientConfig, KrewbiClient, Session, User};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use tokio::sync::watch;
use url::Url;

pub const ANON_KEY: &str = "anon-key";
pub const MATCH_ID: &str = "m-1";

pub fn client_for(server: &ServerGuard) -> KrewbiClient {
    let config = ClientConfig::new(
        Url::parse(&server.url()).expect("mock server url"),
        ANON_KEY,
        Url::parse("https://krewbi.test").expect("site url"),
    );
    KrewbiClient::new(config)
}

/// Client already signed in as `user_id`, with the auth state a view would see.
/// The state never changes, so the sender is dropped.
pub fn signed_in(server: &ServerGuard, user_id: &str) -> (KrewbiClient, watch::Receiver<AuthState>) {
    let client = client_for(server);
    let session = session_for(user_id);
    let state = AuthState {
        user: Some(session.user.clone()),
        loading: false,
    };
    client.set_session(session);
    let (_, rx) = watch::channel(state);
    (client, rx)
}

#[allow(dead_code)]
pub fn anonymous(server: &ServerGuard) -> (KrewbiClient, watch::Receiver<AuthState>) {
    let (_, rx) = watch::channel(AuthState {
        user: None,
        loading: false,
    });
    (client_for(server), rx)
}

pub fn session_for(user_id: &str) -> Session {
    Session {
        access_token: format!("token-{user_id}"),
        refresh_token: format!("refresh-{user_id}"),
        token_type: "bearer".to_string(),
        expires_in: Some(3600),
        user: User {
            id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
            user_metadata: Default::default(),
            app_metadata: Default::default(),
        },
    }
}

pub fn match_row(id: &str, max_players: i32, max_goalkeepers: i32) -> Value {
    json!({
        "id": id,
        "title": format!("Match {id}"),
        "cover_image": null,
        "match_date": "2026-11-05",
        "match_time": "20:00:00",
        "location": "Complejo Norte",
        "format": "7vs7",
        "field_number": 1,
        "will_be_recorded": false,
        "player_price": 5000,
        "goalkeeper_price": 0,
        "max_players": max_players,
        "max_goalkeepers": max_goalkeepers,
        "status": "active",
        "created_at": "2026-10-01T12:00:00+00:00",
        "updated_at": "2026-10-01T12:00:00+00:00"
    })
}

pub fn stats_row(players: i32, max_players: i32, goalkeepers: i32, max_goalkeepers: i32) -> Value {
    let available_players = max_players - players;
    let available_goalkeepers = max_goalkeepers - goalkeepers;
    json!({
        "total_players": players,
        "total_goalkeepers": goalkeepers,
        "available_player_spots": available_players,
        "available_goalkeeper_spots": available_goalkeepers,
        "is_full": available_players <= 0 && available_goalkeepers <= 0
    })
}

pub async fn mock_match(server: &mut ServerGuard, max_players: i32, max_goalkeepers: i32) -> Mock {
    server
        .mock("GET", "/rest/v1/matches")
        .match_query(Matcher::UrlEncoded("id".into(), format!("eq.{MATCH_ID}")))
        .with_body(json!([match_row(MATCH_ID, max_players, max_goalkeepers)]).to_string())
        .create_async()
        .await
}

pub async fn mock_stats(server: &mut ServerGuard, stats: Value) -> Mock {
    server
        .mock("POST", "/rest/v1/rpc/get_match_stats")
        .match_body(Matcher::Json(json!({ "match_uuid": MATCH_ID })))
        .with_body(stats.to_string())
        .create_async()
        .await
}

pub async fn mock_players(server: &mut ServerGuard, players: Value) -> Mock {
    server
        .mock("POST", "/rest/v1/rpc/get_match_players")
        .with_body(players.to_string())
        .create_async()
        .await
}

pub async fn mock_registered(server: &mut ServerGuard, user_id: &str, registered: bool) -> Mock {
    let body = if registered { r#"[{"id":"r-1"}]"# } else { "[]" };
    server
        .mock("GET", "/rest/v1/match_registrations")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("select".into(), "id".into()),
            Matcher::UrlEncoded("user_id".into(), format!("eq.{user_id}")),
        ]))
        .with_body(body)
        .create_async()
        .await
}

pub fn player_row(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "avatar_url": null,
        "position": "player",
        "registeredAt": "2026-10-18T15:00:00+00:00",
        "payment_status": "pending"
    })
}
