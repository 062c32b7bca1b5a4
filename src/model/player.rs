use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{PaymentStatus, Position};
use super::registration::RegistrationRow;

const PLACEHOLDER_AVATAR_URL: &str = "https://via.placeholder.com/40x40";

/// A registered participant as shown on a match page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPlayer {
    /// The participant's user id.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub position: Position,
    #[serde(rename = "registeredAt", alias = "registered_at")]
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

impl MatchPlayer {
    /// Build a display record from a bare registration row. `ordinal` is 1-based.
    pub(crate) fn placeholder(ordinal: usize, row: RegistrationRow) -> Self {
        Self {
            id: row.user_id,
            name: format!("Player {ordinal}"),
            avatar_url: Some(format!("{PLACEHOLDER_AVATAR_URL}?text=P{ordinal}")),
            position: row.position,
            registered_at: row.registration_date,
            payment_status: row.payment_status,
        }
    }
}
