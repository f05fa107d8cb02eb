use super::TaskRule;
use crate::logic::calculations::whole_days_between;
use crate::models::{Pile, Task, TaskKind};
use chrono::{DateTime, Utc};

/// Days-since-log assumed when a pile has no log timestamp at all.
const STALE_LOG_DAYS: i64 = 9_999;

/// Log reminder: fires when nothing has been logged for `interval_days`.
pub struct UpdateLogRule {
    pub interval_days: i64,
}

impl TaskRule for UpdateLogRule {
    fn id(&self) -> &'static str {
        "update_log"
    }

    fn name(&self) -> &'static str {
        "Update Log"
    }

    fn evaluate(&self, pile: &Pile, now: DateTime<Utc>) -> Option<Task> {
        if pile.is_harvested() {
            return None;
        }
        let pile_id = pile.id?;

        let days_since_log = pile
            .last_logged
            .map(|logged| whole_days_between(logged, now))
            .unwrap_or(STALE_LOG_DAYS);

        if days_since_log < self.interval_days {
            return None;
        }

        Some(Task::new(pile_id, &pile.name, TaskKind::UpdateLog, now))
    }
}
