use super::{
    check_harvest::CheckHarvestRule, turn_pile::TurnPileRule, update_log::UpdateLogRule, TaskRule,
};
use crate::config::ReminderConfig;
use crate::models::{Pile, Task};
use chrono::{DateTime, Utc};

pub struct TaskEngine {
    rules: Vec<Box<dyn TaskRule>>,
}

impl TaskEngine {
    pub fn new(config: &ReminderConfig) -> Self {
        // Order matters: it breaks ties between tasks due at the same moment
        let rules: Vec<Box<dyn TaskRule>> = vec![
            Box::new(TurnPileRule {
                interval_days: i64::from(config.turn_interval_days),
            }),
            Box::new(UpdateLogRule {
                interval_days: i64::from(config.log_interval_days),
            }),
            Box::new(CheckHarvestRule {
                fallback_days: i64::from(config.harvest_fallback_days),
            }),
        ];

        Self { rules }
    }

    pub fn evaluate(&self, pile: &Pile, now: DateTime<Utc>) -> Vec<Task> {
        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(pile, now))
            .collect()
    }

    /// Due tasks across all piles, earliest first. The sort is stable so
    /// equal due dates keep pile order and turn -> log -> harvest order.
    pub fn build_tasks(&self, piles: &[Pile], now: DateTime<Utc>) -> Vec<Task> {
        let mut tasks: Vec<Task> = piles
            .iter()
            .flat_map(|pile| self.evaluate(pile, now))
            .collect();
        tasks.sort_by_key(|t| t.due);

        tracing::debug!(piles = piles.len(), tasks = tasks.len(), "Derived tasks");
        tasks
    }

    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.name())).collect()
    }
}

impl Default for TaskEngine {
    fn default() -> Self {
        Self::new(&ReminderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskKind, TurnEvent};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 10, 18, 0, 0).unwrap()
    }

    fn pile(id: i64, age_days: i64) -> Pile {
        let mut p = Pile::new(format!("Pile {}", id), now() - Duration::days(age_days));
        p.id = Some(id);
        p
    }

    #[test]
    fn turned_six_days_ago_with_stale_log() {
        let engine = TaskEngine::default();
        let mut p = pile(1, 20);
        p.turns.push(TurnEvent::new(1, now() - Duration::days(6)));
        p.last_logged = Some(now() - Duration::days(8));

        let tasks = engine.build_tasks(&[p], now());
        let kinds: Vec<TaskKind> = tasks.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TaskKind::TurnPile, TaskKind::UpdateLog]);
        assert!(tasks[0].due <= tasks[1].due);
    }

    #[test]
    fn ties_keep_emission_order() {
        let engine = TaskEngine::default();
        let mut p = pile(1, 200);
        p.turns.push(TurnEvent::new(1, now() - Duration::days(5)));
        p.last_logged = None;

        let tasks = engine.build_tasks(&[p], now());
        let kinds: Vec<TaskKind> = tasks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TaskKind::TurnPile, TaskKind::UpdateLog, TaskKind::CheckHarvest]
        );
        assert!(tasks.iter().all(|t| t.due == now()));
    }

    #[test]
    fn sorted_across_piles_by_due_date() {
        let engine = TaskEngine::default();

        let mut fresh_log = pile(1, 10);
        fresh_log.last_logged = Some(now());
        fresh_log.turns.push(TurnEvent::new(1, now() - Duration::days(5)));

        let mut very_overdue = pile(2, 10);
        very_overdue.last_logged = Some(now());
        very_overdue
            .turns
            .push(TurnEvent::new(2, now() - Duration::days(12)));

        let tasks = engine.build_tasks(&[fresh_log, very_overdue], now());
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].pile_id, 2);
        assert_eq!(tasks[0].due, now() - Duration::days(7));
        assert_eq!(tasks[1].pile_id, 1);
    }

    #[test]
    fn harvested_pile_emits_nothing() {
        let engine = TaskEngine::default();
        let mut p = pile(3, 500);
        p.last_logged = None;
        p.harvested_at = Some(now() - Duration::days(200));
        assert!(engine.build_tasks(&[p], now()).is_empty());
    }

    #[test]
    fn evaluate_single_pile() {
        let engine = TaskEngine::default();
        let mut p = pile(5, 100);
        p.last_logged = Some(now());
        p.turns.push(TurnEvent::new(5, now()));
        let tasks = engine.evaluate(&p, now());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind, TaskKind::CheckHarvest);
    }

    #[test]
    fn lists_rules_in_order() {
        let ids: Vec<&str> = TaskEngine::default()
            .list_rules()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["turn_pile", "update_log", "check_harvest"]);
    }
}
