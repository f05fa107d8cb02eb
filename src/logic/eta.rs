use super::balance::IDEAL_RATIO;
use super::calculations::{months_between, safe_div};
use crate::config::HarvestConfig;
use crate::models::{EtaInputs, EtaResult, Pile};
use chrono::{DateTime, Days, Utc};

/// Formula input is capped at this temperature.
const MAX_TEMP_C: f64 = 70.0;
/// Temperature giving a multiplier of exactly 1.
const REFERENCE_TEMP_C: f64 = 35.0;
const IDEAL_MOISTURE: f64 = 55.0;
const SHRED_FACTOR: f64 = 0.8;
/// Shortest window used when converting a turn count into a monthly rate.
const MIN_TURN_WINDOW_MONTHS: f64 = 1.0 / 3.0;
const MIN_SPEED: f64 = 0.1;
pub const MIN_EFFECTIVE_DAYS: u32 = 7;

/// Harvest date estimator.
///
/// Five unitless factors scale a base duration; a larger factor means faster
/// decomposition and fewer days:
///
/// - temperature: `2^((T - 35) / 10)`, clamped to 0.6..=3.5
/// - moisture: `1 - 0.012 * |M - 55|`, clamped to 0.5..=1.2
/// - brown:green: `1 - 0.07 * |BG - 2.5|`, clamped to 0.6..=1.2
/// - shredding: 0.8 applied to the base when any addition is shredded
/// - turning: `0.75 + 0.04 * turns_per_month`, clamped to 0.75..=1.25
///
/// The result never drops below seven days.
#[derive(Debug, Clone)]
pub struct EtaEngine {
    base_days: u32,
}

impl EtaEngine {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            base_days: config.base_days,
        }
    }

    pub fn base_days(&self) -> u32 {
        self.base_days
    }

    pub fn inputs(&self, pile: &Pile, now: DateTime<Utc>) -> EtaInputs {
        let browns = pile.total_brown();
        let greens = pile.total_green();
        let brown_green_ratio = if browns == 0 && greens == 0 {
            IDEAL_RATIO
        } else {
            f64::from(browns) / f64::from(greens.max(1))
        };

        EtaInputs {
            temperature_c: pile.temperature.nominal_celsius(),
            moisture_percent: pile.moisture.nominal_percent(),
            brown_green_ratio,
            shredded: pile.any_shredded(),
            turns_per_month: turns_per_month(pile, now),
        }
    }

    pub fn compute(&self, pile: &Pile, now: DateTime<Utc>) -> EtaResult {
        let inputs = self.inputs(pile, now);

        let temperature_factor = temperature_factor(inputs.temperature_c);
        let moisture_factor = moisture_factor(inputs.moisture_percent);
        let balance_factor = balance_factor(inputs.brown_green_ratio);
        let shred_factor = if inputs.shredded { SHRED_FACTOR } else { 1.0 };
        let turning_factor = turning_factor(inputs.turns_per_month);

        let speed = (temperature_factor * moisture_factor * balance_factor * turning_factor)
            .max(MIN_SPEED);
        let raw_days = (f64::from(self.base_days) * shred_factor / speed).round();
        let effective_days = (raw_days as u32).max(MIN_EFFECTIVE_DAYS);

        let estimated_date = pile
            .created_at
            .checked_add_days(Days::new(u64::from(effective_days)))
            .unwrap_or(pile.created_at);

        tracing::debug!(
            pile = %pile.name,
            effective_days,
            speed,
            "Computed harvest estimate"
        );

        EtaResult {
            inputs,
            temperature_factor,
            moisture_factor,
            balance_factor,
            shred_factor,
            turning_factor,
            base_days: self.base_days,
            effective_days,
            estimated_date,
        }
    }
}

impl Default for EtaEngine {
    fn default() -> Self {
        Self::new(&HarvestConfig::default())
    }
}

pub fn temperature_factor(temperature_c: f64) -> f64 {
    let t = temperature_c.min(MAX_TEMP_C);
    2f64.powf((t - REFERENCE_TEMP_C) / 10.0).clamp(0.6, 3.5)
}

pub fn moisture_factor(moisture_percent: f64) -> f64 {
    (1.0 - 0.012 * (moisture_percent - IDEAL_MOISTURE).abs()).clamp(0.5, 1.2)
}

pub fn balance_factor(ratio: f64) -> f64 {
    (1.0 - 0.07 * (ratio - IDEAL_RATIO).abs()).clamp(0.6, 1.2)
}

pub fn turning_factor(turns_per_month: f64) -> f64 {
    (0.75 + 0.04 * turns_per_month).clamp(0.75, 1.25)
}

/// Turn count divided by the months since the first turn, with the window
/// floored at a third of a month.
pub fn turns_per_month(pile: &Pile, now: DateTime<Utc>) -> f64 {
    let Some(first) = pile.first_turn() else {
        return 0.0;
    };
    let window = months_between(first, now).max(MIN_TURN_WINDOW_MONTHS);
    safe_div(pile.turns.len() as f64, window, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        MaterialAddition, MaterialKind, MoistureCategory, TemperatureCategory, TurnEvent,
    };
    use chrono::{Duration, TimeZone};

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap()
    }

    fn pile() -> Pile {
        let mut p = Pile::new("Test", created());
        p.id = Some(1);
        p
    }

    fn add(p: &mut Pile, kind: MaterialKind, count: usize, shredded: bool) {
        for _ in 0..count {
            p.additions
                .push(MaterialAddition::new(1, kind, shredded, created()));
        }
    }

    #[test]
    fn factor_reference_points() {
        assert!((temperature_factor(35.0) - 1.0).abs() < 1e-12);
        assert!((temperature_factor(30.0) - 2f64.powf(-0.5)).abs() < 1e-12);
        assert_eq!(temperature_factor(70.0), 3.5);
        assert_eq!(temperature_factor(200.0), 3.5);
        assert_eq!(temperature_factor(-20.0), 0.6);

        assert_eq!(moisture_factor(55.0), 1.0);
        assert!((moisture_factor(40.0) - 0.82).abs() < 1e-12);
        assert!((moisture_factor(70.0) - 0.82).abs() < 1e-12);
        assert_eq!(moisture_factor(0.0), 0.5);

        assert_eq!(balance_factor(2.5), 1.0);
        assert_eq!(balance_factor(40.0), 0.6);

        assert_eq!(turning_factor(0.0), 0.75);
        assert!((turning_factor(5.0) - 0.95).abs() < 1e-12);
        assert_eq!(turning_factor(50.0), 1.25);
    }

    #[test]
    fn default_pile_estimate() {
        // Warm 55C -> 3.5, Humid -> 1.0, neutral ratio -> 1.0, no turns -> 0.75
        let engine = EtaEngine::default();
        let result = engine.compute(&pile(), created());

        assert_eq!(result.temperature_factor, 3.5);
        assert_eq!(result.moisture_factor, 1.0);
        assert_eq!(result.balance_factor, 1.0);
        assert_eq!(result.shred_factor, 1.0);
        assert_eq!(result.turning_factor, 0.75);
        assert_eq!(result.base_days, 90);
        // 90 / 2.625 = 34.29
        assert_eq!(result.effective_days, 34);
        assert_eq!(result.estimated_date, created() + Duration::days(34));
    }

    #[test]
    fn cold_dry_pile_is_slow() {
        let engine = EtaEngine::default();
        let p = pile().with_vitals(TemperatureCategory::Cold, MoistureCategory::Dry);
        let result = engine.compute(&p, created());
        // 0.7071 * 0.82 * 1.0 * 0.75 = 0.4349 -> 90 / 0.4349 = 206.9
        assert_eq!(result.effective_days, 207);
    }

    #[test]
    fn shredding_shortens_estimate() {
        let engine = EtaEngine::default();
        let mut p = pile().with_vitals(TemperatureCategory::Cold, MoistureCategory::Humid);
        add(&mut p, MaterialKind::Brown, 5, false);
        add(&mut p, MaterialKind::Green, 2, false);
        let plain = engine.compute(&p, created());

        p.additions[0].is_shredded = true;
        let shredded = engine.compute(&p, created());

        assert_eq!(shredded.shred_factor, 0.8);
        assert!(shredded.effective_days < plain.effective_days);
    }

    #[test]
    fn ratio_uses_green_floor_of_one() {
        let engine = EtaEngine::default();
        let mut p = pile();
        add(&mut p, MaterialKind::Brown, 6, false);
        let inputs = engine.inputs(&p, created());
        assert_eq!(inputs.brown_green_ratio, 6.0);

        let empty = engine.inputs(&pile(), created());
        assert_eq!(empty.brown_green_ratio, IDEAL_RATIO);
    }

    #[test]
    fn turns_per_month_uses_minimum_window() {
        let mut p = pile();
        let now = created() + Duration::days(5);
        p.turns = vec![
            TurnEvent::new(1, created() + Duration::days(1)),
            TurnEvent::new(1, created() + Duration::days(3)),
        ];
        // Under a third of a month elapsed: 2 / (1/3) = 6
        assert!((turns_per_month(&p, now) - 6.0).abs() < 1e-9);

        // Exactly two calendar months after the first turn: 2 / 2 = 1
        let rate = turns_per_month(&p, created() + Duration::days(62));
        assert!((rate - 1.0).abs() < 1e-9, "rate was {}", rate);
    }

    #[test]
    fn no_turns_means_zero_rate() {
        assert_eq!(turns_per_month(&pile(), created()), 0.0);
    }

    #[test]
    fn estimate_is_deterministic() {
        let engine = EtaEngine::default();
        let mut p = pile().with_vitals(TemperatureCategory::Hot, MoistureCategory::Wet);
        add(&mut p, MaterialKind::Brown, 7, true);
        add(&mut p, MaterialKind::Green, 3, false);
        p.turns.push(TurnEvent::new(1, created() + Duration::days(2)));
        let now = created() + Duration::days(20);

        let a = engine.compute(&p, now);
        let b = engine.compute(&p, now);
        assert_eq!(a.effective_days, b.effective_days);
        assert_eq!(a.estimated_date, b.estimated_date);
        assert_eq!(a, b);
    }

    #[test]
    fn estimate_never_below_floor() {
        let engine = EtaEngine::new(&HarvestConfig { base_days: 10 });
        let temps = TemperatureCategory::all();
        let moistures = MoistureCategory::all();
        for t in temps {
            for m in moistures {
                for shredded in [false, true] {
                    let mut p = pile().with_vitals(*t, *m);
                    add(&mut p, MaterialKind::Brown, 5, shredded);
                    add(&mut p, MaterialKind::Green, 2, false);
                    for d in 0..20 {
                        p.turns.push(TurnEvent::new(1, created() + Duration::days(d)));
                    }
                    let result = engine.compute(&p, created() + Duration::days(21));
                    assert!(result.effective_days >= MIN_EFFECTIVE_DAYS);
                }
            }
        }
    }

    #[test]
    fn more_turning_never_lengthens_estimate() {
        let engine = EtaEngine::default();
        let now = created() + Duration::days(30);
        let mut p = pile().with_vitals(TemperatureCategory::Cold, MoistureCategory::Dry);
        let mut previous = engine.compute(&p, now).effective_days;

        for d in 0..20 {
            p.turns.push(TurnEvent::new(1, created() + Duration::days(d)));
            let current = engine.compute(&p, now).effective_days;
            assert!(
                current <= previous,
                "{} turns: {} days > {} days",
                p.turns.len(),
                current,
                previous
            );
            previous = current;
        }
    }
}
