use super::{MaterialAddition, TurnEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureCategory {
    Cold,
    Warm,
    Hot,
}

impl TemperatureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureCategory::Cold => "Cold",
            TemperatureCategory::Warm => "Warm",
            TemperatureCategory::Hot => "Hot",
        }
    }

    /// Nominal core temperature in °C used as formula input. Not a reading.
    pub fn nominal_celsius(&self) -> f64 {
        match self {
            TemperatureCategory::Cold => 30.0,
            TemperatureCategory::Warm => 55.0,
            TemperatureCategory::Hot => 70.0,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cold" => Some(TemperatureCategory::Cold),
            "warm" => Some(TemperatureCategory::Warm),
            "hot" => Some(TemperatureCategory::Hot),
            _ => None,
        }
    }

    pub fn all() -> &'static [TemperatureCategory] {
        &[
            TemperatureCategory::Cold,
            TemperatureCategory::Warm,
            TemperatureCategory::Hot,
        ]
    }
}

impl std::fmt::Display for TemperatureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoistureCategory {
    Dry,
    Humid,
    Wet,
}

impl MoistureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoistureCategory::Dry => "Dry",
            MoistureCategory::Humid => "Humid",
            MoistureCategory::Wet => "Wet",
        }
    }

    /// Nominal moisture percentage used as formula input.
    pub fn nominal_percent(&self) -> f64 {
        match self {
            MoistureCategory::Dry => 40.0,
            MoistureCategory::Humid => 55.0,
            MoistureCategory::Wet => 70.0,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "dry" => Some(MoistureCategory::Dry),
            "humid" | "moist" => Some(MoistureCategory::Humid),
            "wet" => Some(MoistureCategory::Wet),
            _ => None,
        }
    }

    pub fn all() -> &'static [MoistureCategory] {
        &[
            MoistureCategory::Dry,
            MoistureCategory::Humid,
            MoistureCategory::Wet,
        ]
    }
}

impl std::fmt::Display for MoistureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tracked compost heap together with its logged additions and turns.
///
/// Children are held by value in the snapshot and point back to the pile
/// through `pile_id` only; the store owns the actual rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pile {
    pub id: Option<i64>,
    pub name: String,
    pub temperature: TemperatureCategory,
    pub moisture: MoistureCategory,
    pub method_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub last_logged: Option<DateTime<Utc>>,
    pub harvested_at: Option<DateTime<Utc>>,
    pub estimated_harvest_at: Option<DateTime<Utc>>,
    pub additions: Vec<MaterialAddition>,
    pub turns: Vec<TurnEvent>,
}

impl Pile {
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            name: name.into(),
            temperature: TemperatureCategory::Warm,
            moisture: MoistureCategory::Humid,
            method_id: None,
            created_at,
            last_logged: Some(created_at),
            harvested_at: None,
            estimated_harvest_at: None,
            additions: Vec::new(),
            turns: Vec::new(),
        }
    }

    pub fn with_vitals(
        mut self,
        temperature: TemperatureCategory,
        moisture: MoistureCategory,
    ) -> Self {
        self.temperature = temperature;
        self.moisture = moisture;
        self
    }

    pub fn with_method(mut self, method_id: i64) -> Self {
        self.method_id = Some(method_id);
        self
    }

    pub fn is_harvested(&self) -> bool {
        self.harvested_at.is_some()
    }

    pub fn total_brown(&self) -> u32 {
        self.additions.iter().map(|a| a.brown_amount).sum()
    }

    pub fn total_green(&self) -> u32 {
        self.additions.iter().map(|a| a.green_amount).sum()
    }

    pub fn any_shredded(&self) -> bool {
        self.additions.iter().any(|a| a.is_shredded)
    }

    pub fn first_turn(&self) -> Option<DateTime<Utc>> {
        self.turns.iter().map(|t| t.turned_at).min()
    }

    pub fn last_turn(&self) -> Option<DateTime<Utc>> {
        self.turns.iter().map(|t| t.turned_at).max()
    }
}
