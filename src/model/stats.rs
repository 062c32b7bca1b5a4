use serde::{Deserialize, Serialize};

use super::common::Position;
use super::match_detail::Match;

/// Point-in-time occupancy of a match, computed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub total_players: i32,
    pub total_goalkeepers: i32,
    pub available_player_spots: i32,
    pub available_goalkeeper_spots: i32,
    pub is_full: bool,
}

impl MatchStats {
    /// Snapshot used when the stats call fails: nobody registered, every spot open.
    pub fn empty_for(m: &Match) -> Self {
        Self {
            total_players: 0,
            total_goalkeepers: 0,
            available_player_spots: m.max_players,
            available_goalkeeper_spots: m.max_goalkeepers,
            is_full: false,
        }
    }

    pub fn available_spots(&self, position: Position) -> i32 {
        match position {
            Position::Player => self.available_player_spots,
            Position::Goalkeeper => self.available_goalkeeper_spots,
        }
    }

    pub fn registered(&self, position: Position) -> i32 {
        match position {
            Position::Player => self.total_players,
            Position::Goalkeeper => self.total_goalkeepers,
        }
    }

    pub fn has_spot_for(&self, position: Position) -> bool {
        !self.is_full && self.available_spots(position) > 0
    }
}

/// The stats RPC answers with either a bare object or a one-row set.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum StatsPayload {
    One(MatchStats),
    Many(Vec<MatchStats>),
}

impl StatsPayload {
    pub(crate) fn into_stats(self) -> Option<MatchStats> {
        match self {
            StatsPayload::One(stats) => Some(stats),
            StatsPayload::Many(rows) => rows.into_iter().next(),
        }
    }
}
