use super::TaskRule;
use crate::logic::calculations::whole_days_between;
use crate::models::{Pile, Task, TaskKind};
use chrono::{DateTime, Duration, Utc};

/// Turn reminder
///
/// Fires once the pile has gone `interval_days` without a turn. A pile that
/// has never been turned counts as infinitely overdue and is due now.
///
/// Due date is `now + (interval - days_since_turn)`, which is at or before
/// `now` whenever the rule fires.
pub struct TurnPileRule {
    pub interval_days: i64,
}

impl TaskRule for TurnPileRule {
    fn id(&self) -> &'static str {
        "turn_pile"
    }

    fn name(&self) -> &'static str {
        "Turn Pile"
    }

    fn evaluate(&self, pile: &Pile, now: DateTime<Utc>) -> Option<Task> {
        if pile.is_harvested() {
            return None;
        }
        let pile_id = pile.id?;

        let due = match pile.last_turn() {
            None => now,
            Some(last) => {
                let days_since_turn = whole_days_between(last, now);
                if days_since_turn < self.interval_days {
                    return None;
                }
                now + Duration::days(self.interval_days - days_since_turn)
            }
        };

        Some(Task::new(pile_id, &pile.name, TaskKind::TurnPile, due))
    }
}
