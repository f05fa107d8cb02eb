use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric formula inputs derived from a pile's categorical state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EtaInputs {
    pub temperature_c: f64,
    pub moisture_percent: f64,
    pub brown_green_ratio: f64,
    pub shredded: bool,
    pub turns_per_month: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EtaResult {
    pub inputs: EtaInputs,
    pub temperature_factor: f64,
    pub moisture_factor: f64,
    pub balance_factor: f64,
    pub shred_factor: f64,
    pub turning_factor: f64,
    pub base_days: u32,
    pub effective_days: u32,
    pub estimated_date: DateTime<Utc>,
}

impl EtaResult {
    /// Product of the speed multipliers (shredding excluded; it scales the base).
    pub fn combined_speed(&self) -> f64 {
        self.temperature_factor * self.moisture_factor * self.balance_factor * self.turning_factor
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.estimated_date - now).num_days()
    }
}
