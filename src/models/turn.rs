use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moment a pile was physically turned. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnEvent {
    pub id: Option<i64>,
    pub pile_id: i64,
    pub turned_at: DateTime<Utc>,
}

impl TurnEvent {
    pub fn new(pile_id: i64, turned_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            pile_id,
            turned_at,
        }
    }
}
