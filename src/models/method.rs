use serde::{Deserialize, Serialize};

/// A named composting approach with a fast/slow duration envelope in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompostMethod {
    pub id: Option<i64>,
    pub name: String,
    pub low_days: u32,
    pub high_days: u32,
}

impl CompostMethod {
    pub fn new(name: impl Into<String>, low_days: u32, high_days: u32) -> Self {
        // Normalize so the envelope is always low..=high
        let (low_days, high_days) = if low_days <= high_days {
            (low_days, high_days)
        } else {
            (high_days, low_days)
        };
        Self {
            id: None,
            name: name.into(),
            low_days,
            high_days,
        }
    }

    /// Midpoint of the envelope. Display only; the harvest estimate uses a
    /// fixed base duration.
    pub fn midpoint_days(&self) -> u32 {
        (self.low_days + self.high_days) / 2
    }

    pub fn envelope(&self) -> String {
        format!("{}-{} days", self.low_days, self.high_days)
    }
}
