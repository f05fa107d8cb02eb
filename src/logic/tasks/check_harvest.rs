use super::TaskRule;
use crate::logic::calculations::whole_days_between;
use crate::models::{Pile, Task, TaskKind};
use chrono::{DateTime, Utc};

/// Harvest check
///
/// Fires once a pile's age reaches its stored harvest estimate, or
/// `fallback_days` when no estimate has been stored yet.
pub struct CheckHarvestRule {
    pub fallback_days: i64,
}

impl TaskRule for CheckHarvestRule {
    fn id(&self) -> &'static str {
        "check_harvest"
    }

    fn name(&self) -> &'static str {
        "Check Harvest"
    }

    fn evaluate(&self, pile: &Pile, now: DateTime<Utc>) -> Option<Task> {
        if pile.harvested_at.is_some() {
            return None;
        }
        let pile_id = pile.id?;

        let age_days = whole_days_between(pile.created_at, now);
        let target_days = pile
            .estimated_harvest_at
            .map(|eta| whole_days_between(pile.created_at, eta))
            .unwrap_or(self.fallback_days);

        if age_days < target_days {
            return None;
        }

        Some(Task::new(pile_id, &pile.name, TaskKind::CheckHarvest, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap()
    }

    fn pile_aged(days: i64) -> Pile {
        let mut pile = Pile::new("Bin", now() - Duration::days(days));
        pile.id = Some(9);
        pile
    }

    #[test]
    fn uses_fallback_without_estimate() {
        let rule = CheckHarvestRule { fallback_days: 90 };
        assert!(rule.evaluate(&pile_aged(89), now()).is_none());
        let task = rule.evaluate(&pile_aged(90), now()).unwrap();
        assert_eq!(task.kind, TaskKind::CheckHarvest);
        assert_eq!(task.due, now());
    }

    #[test]
    fn uses_stored_estimate() {
        let rule = CheckHarvestRule { fallback_days: 90 };
        let mut pile = pile_aged(40);
        pile.estimated_harvest_at = Some(pile.created_at + Duration::days(34));
        assert!(rule.evaluate(&pile, now()).is_some());

        pile.estimated_harvest_at = Some(pile.created_at + Duration::days(120));
        assert!(rule.evaluate(&pile, now()).is_none());
    }

    #[test]
    fn harvested_pile_never_fires() {
        let rule = CheckHarvestRule { fallback_days: 90 };
        let mut pile = pile_aged(400);
        pile.harvested_at = Some(now() - Duration::days(100));
        assert!(rule.evaluate(&pile, now()).is_none());
    }
}
