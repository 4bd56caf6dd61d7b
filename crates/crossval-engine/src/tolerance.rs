//! Tolerance engine: stateless "equal enough" checks per value kind
//!
//! Every function assumes both operands are present. NULL handling belongs
//! to the caller.

use chrono::NaiveDateTime;
use crossval_core::{DateTolerance, DecimalPrecision, ToleranceRule, ToleranceType};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Tolerance magnitude as a decimal
///
/// Values too large for `Decimal` saturate; NaN and negatives collapse to zero.
fn tolerance_decimal(value: f64) -> Decimal {
    if value.is_nan() || value <= 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or(Decimal::MAX)
}

/// `lhs * 100 <= tolerance * base`, falling back to floats on overflow
fn within_percent(diff: Decimal, base: Decimal, tolerance: Decimal) -> bool {
    match (diff.checked_mul(HUNDRED), tolerance.checked_mul(base)) {
        (Some(lhs), Some(rhs)) => lhs <= rhs,
        _ => {
            let diff = diff.to_f64().unwrap_or(f64::MAX);
            let base = base.to_f64().unwrap_or(f64::MAX);
            let tolerance = tolerance.to_f64().unwrap_or(f64::MAX);
            diff * 100.0 <= tolerance * base
        }
    }
}

/// Numeric comparison under a tolerance rule
///
/// Percentage tolerance is relative to `a`; a zero base only matches zero.
pub fn numeric_within(a: Decimal, b: Decimal, rule: &ToleranceRule) -> bool {
    let diff = match a.checked_sub(b) {
        Some(d) => d.abs(),
        None => return false,
    };

    match rule.kind {
        ToleranceType::Exact => diff.is_zero(),
        ToleranceType::Absolute => diff <= tolerance_decimal(rule.value),
        ToleranceType::Percentage => {
            if a.is_zero() {
                b.is_zero()
            } else {
                within_percent(diff, a.abs(), tolerance_decimal(rule.value))
            }
        }
    }
}

/// Row count comparison under a tolerance rule
///
/// Percentage difference is relative to the source count; with a zero
/// source it is 0% when the target is also zero and 100% otherwise.
pub fn count_within(source: u64, target: u64, rule: &ToleranceRule) -> bool {
    let diff = Decimal::from(source.abs_diff(target));

    match rule.kind {
        ToleranceType::Exact => diff.is_zero(),
        ToleranceType::Absolute => diff <= tolerance_decimal(rule.value),
        ToleranceType::Percentage => {
            let tolerance = tolerance_decimal(rule.value);
            if source == 0 {
                let percent = if target == 0 { Decimal::ZERO } else { HUNDRED };
                percent <= tolerance
            } else {
                within_percent(diff, Decimal::from(source), tolerance)
            }
        }
    }
}

/// Percentage difference of `target` relative to `source`, for display
pub fn percent_difference(source: u64, target: u64) -> f64 {
    if source == 0 {
        if target == 0 { 0.0 } else { 100.0 }
    } else {
        source.abs_diff(target) as f64 * 100.0 / source as f64
    }
}

/// Instants within `tolerance` of each other (inclusive)
pub fn date_within(a: NaiveDateTime, b: NaiveDateTime, tolerance: &DateTolerance) -> bool {
    let delta = if a >= b { a - b } else { b - a };
    delta <= tolerance.as_duration()
}

/// String equality with optional trimming and case folding
pub fn string_equal(a: &str, b: &str, case_sensitive: bool, trim_spaces: bool) -> bool {
    let (a, b) = if trim_spaces { (a.trim(), b.trim()) } else { (a, b) };
    if case_sensitive {
        a == b
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Decimal equality after rounding half-up to `precision` fractional digits
pub fn decimal_equal(a: Decimal, b: Decimal, precision: DecimalPrecision) -> bool {
    match precision {
        DecimalPrecision::Exact => a == b,
        DecimalPrecision::Digits(n) => {
            let round = |d: Decimal| d.round_dp_with_strategy(n, RoundingStrategy::MidpointAwayFromZero);
            round(a) == round(b)
        }
    }
}
