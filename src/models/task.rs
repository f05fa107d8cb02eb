use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    TurnPile,
    UpdateLog,
    CheckHarvest,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::TurnPile => "Turn Pile",
            TaskKind::UpdateLog => "Update Log",
            TaskKind::CheckHarvest => "Check Harvest",
        }
    }

    /// Stable identifier used in reminder keys.
    pub fn slug(&self) -> &'static str {
        match self {
            TaskKind::TurnPile => "turn",
            TaskKind::UpdateLog => "log",
            TaskKind::CheckHarvest => "harvest",
        }
    }

    pub fn reminder_title(&self) -> &'static str {
        match self {
            TaskKind::TurnPile => "Time to turn your pile",
            TaskKind::UpdateLog => "Log your pile",
            TaskKind::CheckHarvest => "Compost may be ready",
        }
    }

    fn reminder_body(&self, pile_name: &str) -> String {
        match self {
            TaskKind::TurnPile => format!(
                "{} hasn't been turned in a while. Mix it to keep it aerated.",
                pile_name
            ),
            TaskKind::UpdateLog => format!(
                "Record temperature, moisture or new material for {}.",
                pile_name
            ),
            TaskKind::CheckHarvest => format!(
                "{} has reached its estimated harvest date. Check if it's finished.",
                pile_name
            ),
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub pile_id: i64,
    pub pile_name: String,
    pub kind: TaskKind,
    pub due: DateTime<Utc>,
    pub completed: bool,
}

impl Task {
    pub fn new(pile_id: i64, pile_name: &str, kind: TaskKind, due: DateTime<Utc>) -> Self {
        Self {
            pile_id,
            pile_name: pile_name.to_string(),
            kind,
            due,
            completed: false,
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due < now
    }

    /// Alert payload for the reminder scheduler. Completed tasks get none.
    pub fn reminder(&self) -> Option<Reminder> {
        if self.completed {
            return None;
        }
        Some(Reminder {
            key: format!("pile-{}-{}", self.pile_id, self.kind.slug()),
            title: self.kind.reminder_title().to_string(),
            body: self.kind.reminder_body(&self.pile_name),
            fire_at: self.due,
        })
    }
}

/// One locally scheduled alert, keyed by pile and task kind so rescheduling
/// replaces rather than duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub key: String,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reminder_key_is_per_pile_and_kind() {
        let due = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let task = Task::new(7, "Bin A", TaskKind::TurnPile, due);
        let reminder = task.reminder().unwrap();
        assert_eq!(reminder.key, "pile-7-turn");
        assert_eq!(reminder.title, "Time to turn your pile");
        assert!(reminder.body.contains("Bin A"));
        assert_eq!(reminder.fire_at, due);
    }

    #[test]
    fn completed_task_has_no_reminder() {
        let due = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let mut task = Task::new(7, "Bin A", TaskKind::CheckHarvest, due);
        task.completed = true;
        assert!(task.reminder().is_none());
        assert!(!task.is_overdue(due + chrono::Duration::days(3)));
    }

    #[test]
    fn slugs_are_distinct() {
        let slugs = [
            TaskKind::TurnPile.slug(),
            TaskKind::UpdateLog.slug(),
            TaskKind::CheckHarvest.slug(),
        ];
        assert_eq!(slugs, ["turn", "log", "harvest"]);
    }
}
