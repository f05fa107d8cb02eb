use super::calculations::{band_progress, simplify_ratio, units_short};
use crate::models::{Adjustment, BalanceRecommendation, BalanceSeverity};

/// Target brown:green ratio by unit count.
pub const IDEAL_RATIO: f64 = 2.5;
pub const ACCEPTABLE_LOW: f64 = 2.0;
pub const ACCEPTABLE_HIGH: f64 = 3.0;

/// Nudge toward ideal only when the ratio is at least this far from it.
const NUDGE_TOLERANCE: f64 = 0.01;

/// Brown:green balance advice.
///
/// Bands by ratio (browns / greens):
/// - below 2.0: too many greens, add browns
/// - 2.0 to 3.0: acceptable, optional nudge toward 2.5
/// - above 3.0: too many browns, add greens
///
/// Every suggested count is the smallest whole number of units that
/// reaches the target.
pub fn recommend(browns: u32, greens: u32) -> BalanceRecommendation {
    if browns == 0 && greens == 0 {
        return build_empty();
    }

    if greens == 0 {
        return build_browns_only(browns);
    }

    let ratio = f64::from(browns) / f64::from(greens);
    let progress = band_progress(ratio, ACCEPTABLE_LOW, ACCEPTABLE_HIGH);

    if ratio < ACCEPTABLE_LOW {
        let needed = units_short(ACCEPTABLE_LOW * f64::from(greens), browns);
        build_too_many_greens(browns, greens, ratio, progress, needed)
    } else if ratio > ACCEPTABLE_HIGH {
        let target_greens = f64::from(browns) / ACCEPTABLE_HIGH;
        let needed = units_short(target_greens, greens);
        build_too_many_browns(browns, greens, ratio, progress, needed)
    } else {
        build_balanced(browns, greens, ratio, progress)
    }
}

fn build_empty() -> BalanceRecommendation {
    BalanceRecommendation::new(
        BalanceSeverity::Empty,
        "Start Your Pile",
        "Nothing has been added yet. Begin with a layer of browns (dry leaves, \
         cardboard, straw) and add greens (food scraps, fresh clippings) as you go, \
         aiming for about 2.5 browns per green.",
        0.0,
        0.0,
    )
}

fn build_browns_only(browns: u32) -> BalanceRecommendation {
    let needed = units_short(f64::from(browns) / IDEAL_RATIO, 0).max(1);

    // No greens means no real ratio; the brown count stands in for it.
    BalanceRecommendation::new(
        BalanceSeverity::WarnBrowns,
        "Needs Greens",
        format!(
            "Only browns so far ({}). Without nitrogen the pile won't heat up. \
             Add greens such as food scraps, coffee grounds or fresh clippings.",
            browns
        ),
        f64::from(browns),
        1.0,
    )
    .with_required(Adjustment::AddGreens(needed))
}

fn build_too_many_greens(
    browns: u32,
    greens: u32,
    ratio: f64,
    progress: f64,
    needed: u32,
) -> BalanceRecommendation {
    BalanceRecommendation::new(
        BalanceSeverity::WarnGreens,
        "Too Many Greens",
        format!(
            "Ratio is {} ({:.1}:1), below {:.1}:1. Excess nitrogen makes a wet, smelly pile. \
             Mix in browns such as shredded leaves, cardboard or straw.",
            format_ratio(browns, greens),
            ratio,
            ACCEPTABLE_LOW
        ),
        ratio,
        progress,
    )
    .with_required(Adjustment::AddBrowns(needed))
}

fn build_too_many_browns(
    browns: u32,
    greens: u32,
    ratio: f64,
    progress: f64,
    needed: u32,
) -> BalanceRecommendation {
    BalanceRecommendation::new(
        BalanceSeverity::WarnBrowns,
        "Too Many Browns",
        format!(
            "Ratio is {} ({:.1}:1), above {:.1}:1. A carbon-heavy pile breaks down slowly. \
             Add greens such as food scraps or fresh clippings.",
            format_ratio(browns, greens),
            ratio,
            ACCEPTABLE_HIGH
        ),
        ratio,
        progress,
    )
    .with_required(Adjustment::AddGreens(needed))
}

fn build_balanced(browns: u32, greens: u32, ratio: f64, progress: f64) -> BalanceRecommendation {
    let mut rec = BalanceRecommendation::new(
        BalanceSeverity::Ok,
        "Well Balanced",
        format!(
            "Ratio is {} ({:.1}:1), inside the {:.1}-{:.1} range. Keep alternating browns and greens.",
            format_ratio(browns, greens),
            ratio,
            ACCEPTABLE_LOW,
            ACCEPTABLE_HIGH
        ),
        ratio,
        progress,
    );

    if (ratio - IDEAL_RATIO).abs() >= NUDGE_TOLERANCE {
        let nudge = if ratio < IDEAL_RATIO {
            Adjustment::AddBrowns(units_short(IDEAL_RATIO * f64::from(greens), browns))
        } else {
            Adjustment::AddGreens(units_short(f64::from(browns) / IDEAL_RATIO, greens))
        };
        rec = rec.with_nudge(nudge);
    }

    rec
}

/// Brown:green counts reduced to lowest terms, e.g. `5:2`.
pub fn format_ratio(browns: u32, greens: u32) -> String {
    let (b, g) = simplify_ratio(browns, greens);
    format!("{}:{}", b, g)
}
