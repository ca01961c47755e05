//! Savings projections. Pure functions over already-validated numbers.

use chrono::{DateTime, Utc};

use crate::{WalletState, calculator::total, util::parse_timestamp};

/// Average number of days in a month, used to turn a daily pace into a
/// monthly one.
pub const AVERAGE_DAYS_PER_MONTH: f64 = 30.44;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Where a linear plan takes the current total.
#[derive(Clone, Debug, PartialEq)]
pub struct SavingsProjection {
    pub current_total: f64,
    pub monthly: f64,
    pub months: u64,
    pub projected_total: f64,
}

/// Pace needed to reach a goal by its deadline.
#[derive(Clone, Debug, PartialEq)]
pub struct GoalProjection {
    pub remaining: f64,
    pub days_left: i64,
    pub required_per_day: f64,
    pub required_per_week: f64,
    pub required_per_month: f64,
    pub is_deadline_passed: bool,
}

/// `total + monthly × months`. Non-finite or negative plan inputs count as 0,
/// as does a non-finite total.
pub fn linear_projection(total: f64, monthly: f64, months: f64) -> f64 {
    let total = if total.is_finite() { total } else { 0.0 };
    let monthly = if monthly.is_finite() && monthly >= 0.0 { monthly } else { 0.0 };
    let months = if months.is_finite() && months >= 0.0 { months } else { 0.0 };
    total + monthly * months
}

/// Projection of a wallet's own plan.
pub fn savings_projection(state: &WalletState) -> SavingsProjection {
    let current_total = total(state) as f64;
    let plan = state.plan();
    SavingsProjection {
        current_total,
        monthly: plan.monthly,
        months: plan.months,
        projected_total: linear_projection(current_total, plan.monthly, plan.months as f64),
    }
}

/// Pace needed from now on. See [`required_to_deadline_at`].
pub fn required_to_deadline(total: f64, target: f64, deadline: &str) -> GoalProjection {
    required_to_deadline_at(total, target, deadline, Utc::now())
}

/// Pace needed from `now` to reach `target` by `deadline`.
///
/// An unparseable deadline, or one that is not at least partly in the
/// future, is reported as passed with zero rates.
pub fn required_to_deadline_at(
    total: f64,
    target: f64,
    deadline: &str,
    now: DateTime<Utc>,
) -> GoalProjection {
    let total = if total.is_finite() { total } else { 0.0 };
    let target = if target.is_finite() && target >= 0.0 { target } else { 0.0 };
    let remaining = (target - total).max(0.0);

    let passed = |days_left| GoalProjection {
        remaining,
        days_left,
        required_per_day: 0.0,
        required_per_week: 0.0,
        required_per_month: 0.0,
        is_deadline_passed: true,
    };

    let Some(deadline) = parse_timestamp(deadline) else {
        return passed(0);
    };

    let days_left = ((deadline - now).num_milliseconds() as f64 / MILLIS_PER_DAY).ceil() as i64;
    if days_left <= 0 {
        return passed(days_left);
    }

    let required_per_day = remaining / days_left as f64;
    GoalProjection {
        remaining,
        days_left,
        required_per_day,
        required_per_week: required_per_day * 7.0,
        required_per_month: required_per_day * AVERAGE_DAYS_PER_MONTH,
        is_deadline_passed: false,
    }
}
