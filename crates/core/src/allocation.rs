//! Allocation arithmetic: percentages, remaining budget, and weighted
//! progress over donor and activity allocations.
//!
//! Every function here is total: an unset (zero) budget yields zero rather
//! than a division error so the form never breaks mid-entry. Sums that leave
//! the `Decimal` range saturate at `Decimal::MAX` / `Decimal::MIN` instead of
//! panicking.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::draft::{Activity, DonorAllocation};
use crate::types::Money;

/// Decimal places kept for derived percentages and progress.
pub const PERCENT_SCALE: u32 = 2;

fn round_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn saturate_like(sign_of: Decimal) -> Decimal {
    if sign_of.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

/// Sum without saturation. `None` when the sum leaves the `Decimal` range.
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// `amount / total * 100`, or `0` when `total <= 0`.
///
/// A ratio too large to represent saturates to `Decimal::MAX` (or
/// `Decimal::MIN` for a negative amount).
pub fn percentage_of(amount: Money, total: Money) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    amount
        .checked_div(total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round_percent)
        .unwrap_or_else(|| saturate_like(amount))
}

/// Keep a persisted percentage when it agrees with `amount / total * 100`
/// to within one unit at [`PERCENT_SCALE`]. Otherwise the derived value
/// wins.
pub fn reconcile_percentage(stored: Decimal, amount: Money, total: Money) -> Decimal {
    let derived = percentage_of(amount, total);
    let tolerance = Decimal::new(1, PERCENT_SCALE);
    match stored.checked_sub(derived) {
        Some(diff) if diff.abs() <= tolerance => stored,
        _ => derived,
    }
}

/// Sum a sequence of allocations, saturating at the `Decimal` bounds.
pub fn allocated_sum(allocations: impl IntoIterator<Item = Money>) -> Money {
    allocations
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

/// `total - sum(allocations)`. Negative means over-allocated and is returned
/// as-is.
pub fn remaining(total: Money, allocations: impl IntoIterator<Item = Money>) -> Money {
    total.saturating_sub(allocated_sum(allocations))
}

/// What the allocated sum would become if the entry at `replace_index` took
/// the value `proposed`. Passing an index past the end treats `proposed` as a
/// new entry.
///
/// `None` when the projected sum is not representable.
pub fn projected_total(existing: &[Money], replace_index: usize, proposed: Money) -> Option<Money> {
    let others = checked_sum(
        existing
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != replace_index)
            .map(|(_, amount)| *amount),
    )?;
    others.checked_add(proposed)
}

/// Budget-weighted mean of activity progress, rounded to 2 dp.
///
/// Returns `0` when there are no activities or none carries budget. When the
/// exact products overflow, each progress value is weighted by its budget
/// share instead, which stays within range.
pub fn weighted_progress(activities: &[Activity]) -> Decimal {
    let budget_sum = allocated_sum(activities.iter().map(|a| a.budget_assigned));
    if budget_sum.is_zero() {
        return Decimal::ZERO;
    }
    exact_weighted(activities, budget_sum)
        .or_else(|| share_weighted(activities, budget_sum))
        .map(round_percent)
        .unwrap_or(Decimal::ZERO)
}

fn exact_weighted(activities: &[Activity], budget_sum: Money) -> Option<Decimal> {
    let weighted = activities.iter().try_fold(Decimal::ZERO, |acc, a| {
        acc.checked_add(a.progress.checked_mul(a.budget_assigned)?)
    })?;
    weighted.checked_div(budget_sum)
}

fn share_weighted(activities: &[Activity], budget_sum: Money) -> Option<Decimal> {
    activities.iter().try_fold(Decimal::ZERO, |acc, a| {
        let share = a.budget_assigned.checked_div(budget_sum)?;
        acc.checked_add(a.progress.checked_mul(share)?)
    })
}

/// Sum of donor percentages rounded to a whole number.
pub fn percentage_sum_rounded(donors: &[DonorAllocation]) -> Decimal {
    allocated_sum(donors.iter().map(|d| d.percentage))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
