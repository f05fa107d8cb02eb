pub mod check_harvest;
pub mod engine;
pub mod turn_pile;
pub mod update_log;

pub use engine::TaskEngine;

use crate::models::{Pile, Task};
use chrono::{DateTime, Utc};

/// Trait for due-task rules
pub trait TaskRule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Evaluate the rule against one pile and return a task if it is due
    fn evaluate(&self, pile: &Pile, now: DateTime<Utc>) -> Option<Task>;
}
