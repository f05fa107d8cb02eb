use serde::{Deserialize, Serialize};

/// Brown:green balance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceSeverity {
    Empty,
    Ok,
    WarnGreens,
    WarnBrowns,
}

impl BalanceSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceSeverity::Empty => "Empty",
            BalanceSeverity::Ok => "Balanced",
            BalanceSeverity::WarnGreens => "Too Many Greens",
            BalanceSeverity::WarnBrowns => "Too Many Browns",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BalanceSeverity::Empty => "ℹ",
            BalanceSeverity::Ok => "✓",
            BalanceSeverity::WarnGreens | BalanceSeverity::WarnBrowns => "⚠",
        }
    }

    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            BalanceSeverity::WarnGreens | BalanceSeverity::WarnBrowns
        )
    }
}

impl std::fmt::Display for BalanceSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whole units of one material type to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Adjustment {
    AddBrowns(u32),
    AddGreens(u32),
}

impl Adjustment {
    pub fn units(&self) -> u32 {
        match self {
            Adjustment::AddBrowns(n) | Adjustment::AddGreens(n) => *n,
        }
    }
}

impl std::fmt::Display for Adjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Adjustment::AddBrowns(1) => write!(f, "add 1 brown"),
            Adjustment::AddBrowns(n) => write!(f, "add {} browns", n),
            Adjustment::AddGreens(1) => write!(f, "add 1 green"),
            Adjustment::AddGreens(n) => write!(f, "add {} greens", n),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceRecommendation {
    pub severity: BalanceSeverity,
    pub title: String,
    pub guidance: String,
    /// Minimal addition that brings the pile into the acceptable band.
    pub required: Option<Adjustment>,
    /// Optional step from inside the band toward the exact ideal.
    pub nudge: Option<Adjustment>,
    pub ratio: f64,
    pub progress: f64,
}

impl BalanceRecommendation {
    pub fn new(
        severity: BalanceSeverity,
        title: impl Into<String>,
        guidance: impl Into<String>,
        ratio: f64,
        progress: f64,
    ) -> Self {
        Self {
            severity,
            title: title.into(),
            guidance: guidance.into(),
            required: None,
            nudge: None,
            ratio,
            progress: progress.clamp(0.0, 1.0),
        }
    }

    pub fn with_required(mut self, adjustment: Adjustment) -> Self {
        self.required = Some(adjustment).filter(|a| a.units() > 0);
        self
    }

    pub fn with_nudge(mut self, adjustment: Adjustment) -> Self {
        self.nudge = Some(adjustment).filter(|a| a.units() > 0);
        self
    }

    /// Next thing to do, preferring the required fix over the nudge.
    pub fn next_step(&self) -> Option<Adjustment> {
        self.required.or(self.nudge)
    }
}
