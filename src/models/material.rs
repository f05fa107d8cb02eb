use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialKind {
    Brown,
    Green,
}

impl MaterialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::Brown => "Brown",
            MaterialKind::Green => "Green",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "brown" | "browns" | "carbon" => Some(MaterialKind::Brown),
            "green" | "greens" | "nitrogen" => Some(MaterialKind::Green),
            _ => None,
        }
    }
}

impl std::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One logged unit of material. Exactly one of the amounts is 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialAddition {
    pub id: Option<i64>,
    pub pile_id: i64,
    pub brown_amount: u32,
    pub green_amount: u32,
    pub is_shredded: bool,
    pub created_at: DateTime<Utc>,
}

impl MaterialAddition {
    pub fn new(
        pile_id: i64,
        kind: MaterialKind,
        is_shredded: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        let (brown_amount, green_amount) = match kind {
            MaterialKind::Brown => (1, 0),
            MaterialKind::Green => (0, 1),
        };
        Self {
            id: None,
            pile_id,
            brown_amount,
            green_amount,
            is_shredded,
            created_at,
        }
    }

    pub fn kind(&self) -> MaterialKind {
        if self.brown_amount >= self.green_amount {
            MaterialKind::Brown
        } else {
            MaterialKind::Green
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn material_kind_from_str() {
        assert_eq!(MaterialKind::from_str("brown"), Some(MaterialKind::Brown));
        assert_eq!(MaterialKind::from_str("Greens"), Some(MaterialKind::Green));
        assert_eq!(MaterialKind::from_str("carbon"), Some(MaterialKind::Brown));
        assert_eq!(MaterialKind::from_str("blue"), None);
    }

    #[test]
    fn addition_is_one_unit_of_one_kind() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();

        let brown = MaterialAddition::new(3, MaterialKind::Brown, true, ts);
        assert_eq!((brown.brown_amount, brown.green_amount), (1, 0));
        assert_eq!(brown.kind(), MaterialKind::Brown);
        assert!(brown.is_shredded);

        let green = MaterialAddition::new(3, MaterialKind::Green, false, ts);
        assert_eq!((green.brown_amount, green.green_amount), (0, 1));
        assert_eq!(green.kind(), MaterialKind::Green);
    }
}
