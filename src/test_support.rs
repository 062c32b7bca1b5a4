//! Fixtures shared by the unit tests.

use url::Url;

use crate::config::ClientConfig;
use crate::model::{Session, User};
use crate::KrewbiClient;

pub(crate) const ANON_KEY: &str = "anon-key";

pub(crate) fn client_for(server: &mockito::ServerGuard) -> KrewbiClient {
    let config = ClientConfig::new(
        Url::parse(&server.url()).unwrap(),
        ANON_KEY,
        Url::parse("https://krewbi.test").unwrap(),
    );
    KrewbiClient::new(config)
}

pub(crate) fn session_for(user_id: &str) -> Session {
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

pub(crate) fn match_row(id: &str, max_players: i32, max_goalkeepers: i32) -> serde_json::Value {
    serde_json::json!({
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

pub(crate) fn stats_row(
    players: i32,
    max_players: i32,
    goalkeepers: i32,
    max_goalkeepers: i32,
) -> serde_json::Value {
    let available_players = max_players - players;
    let available_goalkeepers = max_goalkeepers - goalkeepers;
    serde_json::json!({
        "total_players": players,
        "total_goalkeepers": goalkeepers,
        "available_player_spots": available_players,
        "available_goalkeeper_spots": available_goalkeepers,
        "is_full": available_players <= 0 && available_goalkeepers <= 0
    })
}
