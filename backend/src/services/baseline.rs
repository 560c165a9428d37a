//! Rolling baseline price calculation.
//!
//! The baseline is the arithmetic mean of prices over a trailing multi-day
//! window and serves as the reference for relative classification. It is a
//! pure function of its inputs so the classifier and planner stay testable
//! without a database.

use crate::models::Price;
use chrono::{Duration, NaiveDateTime};

/// Used when the trailing window holds no prices at all; the planner must
/// still produce a decision. €/kWh.
pub const FALLBACK_BASELINE_PRICE: f64 = 0.15;

/// Which price field a planning run decides on. Chosen once per run so the
/// baseline and the per-hour decisions never mix fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Total,
    Energy,
}

impl PriceField {
    /// Prefer the refined energy price only when every point in every input
    /// set carries it; otherwise fall back to the total price for the whole
    /// run.
    pub fn choose(sets: &[&[Price]]) -> PriceField {
        let mut any = false;
        for set in sets {
            for price in set.iter() {
                any = true;
                if price.energy_price.is_none() {
                    return PriceField::Total;
                }
            }
        }
        if any { PriceField::Energy } else { PriceField::Total }
    }

    pub fn value_of(&self, price: &Price) -> f64 {
        match self {
            PriceField::Total => price.total_price,
            PriceField::Energy => price.energy_price.unwrap_or(price.total_price),
        }
    }
}

/// Start of the trailing window, saturating at the earliest representable
/// time so an oversized `window_days` widens the window instead of
/// panicking on datetime overflow.
pub fn window_start(now: NaiveDateTime, window_days: i32) -> NaiveDateTime {
    Duration::try_days(window_days as i64)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Mean price over the trailing window `[now - window_days, now]`.
///
/// Prices outside the window are ignored. An empty window yields
/// [`FALLBACK_BASELINE_PRICE`] rather than an error.
pub fn rolling_average(
    prices: &[Price],
    window_days: i32,
    now: NaiveDateTime,
    field: PriceField,
) -> f64 {
    let window_start = window_start(now, window_days);

    let in_window: Vec<f64> = prices
        .iter()
        .filter(|p| p.start_time >= window_start && p.start_time <= now)
        .map(|p| field.value_of(p))
        .collect();

    if in_window.is_empty() {
        return FALLBACK_BASELINE_PRICE;
    }

    in_window.iter().sum::<f64>() / in_window.len() as f64
}
