use krewbi::{KrewbiClient, Position};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let client = KrewbiClient::from_env()?;
    let matches = client.list_active_matches().await?;
    println!("Found {} upcoming matches", matches.len());

    for m in &matches {
        let details = &m.details;
        let stats = m.stats.value();
        println!(
            "{} {} | {} @ {} (field {})",
            details.match_date,
            details.match_time.format("%H:%M"),
            details.title,
            details.location,
            details.field_number,
        );
        println!(
            "    players {}/{}  goalkeepers {}/{}{}{}",
            stats.registered(Position::Player),
            details.max_players,
            stats.registered(Position::Goalkeeper),
            details.max_goalkeepers,
            if stats.is_full { "  FULL" } else { "" },
            if m.stats.is_fallback() { "  (stats unavailable)" } else { "" },
        );

        let players = client.list_players(&details.id).await;
        for player in players.value() {
            println!("      - {} ({})", player.name, player.position);
        }
    }

    if let Some(first) = matches.first() {
        println!("{}", serde_json::to_string_pretty(first)?);
    }

    Ok(())
}
