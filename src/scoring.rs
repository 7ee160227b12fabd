//! Weighted suitability score
//!
//! `score` is a pure function of the classification and two link-presence
//! flags. Stored scores are always produced here, never set by hand.

use crate::classifier::Classification;

/// Scores at or above this value mark an item as promising
pub const PROMISING_THRESHOLD: u8 = 75;

const INNOVATION_WEIGHT: f64 = 0.35;
const TECHNICAL_WEIGHT: f64 = 0.30;
const DISRUPTIVENESS_WEIGHT: f64 = 0.25;

const WHITEPAPER_BONUS: i32 = 5;
const GITHUB_BONUS: i32 = 5;
const ORIGINAL_PROJECT_BONUS: i32 = 10;

/// Computes the final score in `[0, 100]`
///
/// ```text
/// base  = innovation*0.35 + technical*0.30 + disruptiveness*0.25
/// bonus = +5 whitepaper, +5 github, +10 when not a fork
/// final = clamp(round(base + bonus + premine_penalty), 0, 100)
/// ```
///
/// # Example
///
/// ```
/// use talkscan::classifier::Classification;
/// use talkscan::scoring::score;
///
/// let c = Classification {
///     innovation_score: 80,
///     technical_score: 70,
///     disruptiveness_score: 60,
///     premine_estimate: 3.0,
///     ..Default::default()
/// };
/// assert_eq!(score(&c, true, true), 84);
/// ```
pub fn score(classification: &Classification, has_whitepaper: bool, has_github: bool) -> u8 {
    let base = f64::from(classification.innovation_score) * INNOVATION_WEIGHT
        + f64::from(classification.technical_score) * TECHNICAL_WEIGHT
        + f64::from(classification.disruptiveness_score) * DISRUPTIVENESS_WEIGHT;

    let mut adjustment = 0;
    if has_whitepaper {
        adjustment += WHITEPAPER_BONUS;
    }
    if has_github {
        adjustment += GITHUB_BONUS;
    }
    if !classification.is_fork {
        adjustment += ORIGINAL_PROJECT_BONUS;
    }
    adjustment += premine_penalty(classification.premine_estimate);

    let total = (base + f64::from(adjustment)).round();
    total.clamp(0.0, 100.0) as u8
}

/// Malus for a large premine; thresholds are strict (`> 20`, `> 10`, `> 5`)
pub fn premine_penalty(premine_pct: f64) -> i32 {
    if premine_pct > 20.0 {
        -25
    } else if premine_pct > 10.0 {
        -15
    } else if premine_pct > 5.0 {
        -5
    } else {
        0
    }
}

/// An item is promising iff its final score reaches the threshold
pub fn is_promising(final_score: u8) -> bool {
    final_score >= PROMISING_THRESHOLD
}
