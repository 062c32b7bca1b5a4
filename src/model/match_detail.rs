use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use super::common::{Fetched, Position};
use super::stats::MatchStats;

/// A scheduled match as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub match_date: NaiveDate,
    #[serde(with = "match_time")]
    pub match_time: NaiveTime,
    pub location: String,
    /// Format tag such as `7vs7`.
    pub format: String,
    pub field_number: u32,
    pub will_be_recorded: bool,
    pub player_price: f64,
    pub goalkeeper_price: f64,
    pub max_players: i32,
    pub max_goalkeepers: i32,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn capacity(&self, position: Position) -> i32 {
        match position {
            Position::Player => self.max_players,
            Position::Goalkeeper => self.max_goalkeepers,
        }
    }

    pub fn price(&self, position: Position) -> f64 {
        match position {
            Position::Player => self.player_price,
            Position::Goalkeeper => self.goalkeeper_price,
        }
    }
}

/// Lifecycle status of a match. Transitions happen on the backend only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchStatus {
    Active,
    Full,
    Cancelled,
    Completed,
}

/// A match together with the stats snapshot fetched alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchWithStats {
    #[serde(flatten)]
    pub details: Match,
    pub stats: Fetched<MatchStats>,
}

impl MatchWithStats {
    /// Client-side capacity gate. The backend stays authoritative on insert.
    pub fn has_spot_for(&self, position: Position) -> bool {
        self.stats.value().has_spot_for(position)
    }
}

/// A list of upcoming matches with their stats.
pub type MatchList = Vec<MatchWithStats>;

/// Accepts both `HH:MM:SS` (Postgres `time`) and `HH:MM`.
mod match_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const MATCH_TIME_FORMAT: &str = "%H:%M:%S";
    const MATCH_TIME_FORMAT_ALT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(MATCH_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, MATCH_TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, MATCH_TIME_FORMAT_ALT))
            .map_err(serde::de::Error::custom)
    }
}
