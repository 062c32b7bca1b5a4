use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{PaymentStatus, Position};

/// A user's registration for a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRegistration {
    pub id: String,
    pub match_id: String,
    pub user_id: String,
    pub position: Position,
    pub registration_date: DateTime<Utc>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
}

/// Insert payload for `match_registrations`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewRegistration<'a> {
    pub match_id: &'a str,
    pub user_id: &'a str,
    pub position: Position,
}

/// The columns read when the players RPC is unavailable.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RegistrationRow {
    pub user_id: String,
    pub registration_date: DateTime<Utc>,
    pub position: Position,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}
