//! Daily schedule building.
//!
//! Turns a day's price points into one schedule entry per hour and replaces
//! the prior schedule for that date. Planning itself is pure (`plan_day`);
//! persistence wraps it in a single transaction so the executor never sees a
//! half-replaced day.

use crate::db::DbPool;
use crate::models::{AutomationSettings, NewScheduleEntry, Price, ScheduleEntry};
use crate::schema::schedule_entries;
use crate::services::baseline::{self, rolling_average, PriceField};
use crate::services::classifier::classify;
use crate::services::planner::plan;
use crate::services::price_store::PriceStore;
use crate::services::{settings, ScheduleError};
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use diesel::prelude::*;
use log::{info, warn};

/// Pure planning result for one day.
#[derive(Debug, Clone)]
pub struct DayPlan {
    pub entries: Vec<NewScheduleEntry>,
    pub average_price: f64,
    pub field: PriceField,
}

/// Outcome of a persisted build, as exposed through the API.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub entries: Vec<ScheduleEntry>,
    pub average_price: f64,
    pub baseline_temp: f64,
}

/// Plan a full day without touching storage.
///
/// The rolling average is computed exactly once and reused for every hour,
/// so the baseline cannot drift within a single planning run. Duplicate
/// hours in the input (e.g. the same hour from two price sources) collapse
/// to the first occurrence.
pub fn plan_day(
    date: NaiveDate,
    day_prices: &[Price],
    trailing_prices: &[Price],
    settings: &AutomationSettings,
    now: NaiveDateTime,
) -> Result<DayPlan, ScheduleError> {
    if !settings.automation_enabled {
        return Err(ScheduleError::AutomationDisabled);
    }
    settings::validate(settings).map_err(ScheduleError::InvalidSettings)?;
    if day_prices.is_empty() {
        return Err(ScheduleError::NoPriceData(date));
    }

    let field = PriceField::choose(&[day_prices, trailing_prices]);
    let average = rolling_average(
        trailing_prices,
        settings.rolling_window_days,
        now,
        field,
    );

    let mut entries: Vec<NewScheduleEntry> = Vec::with_capacity(day_prices.len());
    for price_point in day_prices {
        let hour = price_point.start_time.hour() as i32;
        if entries.iter().any(|e| e.hour == hour) {
            warn!(
                "Duplicate price point for {} hour {} (source {}), keeping the first",
                date, hour, price_point.source
            );
            continue;
        }

        let price = field.value_of(price_point);
        let classification = classify(price, average, settings);
        let decision = plan(classification, settings.baseline_temp, price, settings);

        entries.push(NewScheduleEntry {
            for_date: date,
            hour,
            price_value: price,
            classification: classification.as_str().to_string(),
            target_temperature: decision.target_temperature,
            reason: decision.reason,
        });
    }

    Ok(DayPlan {
        entries,
        average_price: average,
        field,
    })
}

/// Builds and persists the day's schedule.
pub struct ScheduleBuilder {
    pool: DbPool,
}

impl ScheduleBuilder {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Convenience wrapper for the daily trigger: build today's schedule.
    pub fn build_today(&self) -> Result<BuildOutcome, ScheduleError> {
        let now = Local::now().naive_local();
        self.build_for_date(now.date(), now)
    }

    /// Plan the given date and atomically replace its prior schedule.
    ///
    /// Only entries that have not executed yet are deleted, so regeneration
    /// never resurrects an entry that already acted on the device and the
    /// audit trail of executed hours survives. The delete and insert share a
    /// transaction; together with the unique `(for_date, hour)` constraint
    /// (conflicts are a benign no-op) a duplicate trigger cannot produce
    /// duplicate hours or a visible gap.
    pub fn build_for_date(
        &self,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<BuildOutcome, ScheduleError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| ScheduleError::Persistence(format!("Database connection error: {}", e)))?;

        let active_settings = settings::get_active(&mut conn)?;

        let store = PriceStore::new(self.pool.clone());
        let day_prices = store.prices_for_date(&active_settings.bidding_zone, date)?;
        let window_start = baseline::window_start(now, active_settings.rolling_window_days);
        let trailing_prices =
            store.prices_between(&active_settings.bidding_zone, window_start, now)?;

        let day_plan = plan_day(date, &day_prices, &trailing_prices, &active_settings, now)?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(
                schedule_entries::table
                    .filter(schedule_entries::for_date.eq(date))
                    .filter(schedule_entries::executed.eq(false)),
            )
            .execute(conn)?;

            diesel::insert_into(schedule_entries::table)
                .values(&day_plan.entries)
                .on_conflict((schedule_entries::for_date, schedule_entries::hour))
                .do_nothing()
                .execute(conn)?;

            Ok(())
        })?;

        let entries = schedule_entries::table
            .filter(schedule_entries::for_date.eq(date))
            .order(schedule_entries::hour.asc())
            .load::<ScheduleEntry>(&mut conn)?;

        info!(
            "Built schedule for {}: {} entries, rolling average {:.4} €/kWh",
            date,
            entries.len(),
            day_plan.average_price
        );

        Ok(BuildOutcome {
            entries,
            average_price: day_plan.average_price,
            baseline_temp: active_settings.baseline_temp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceClass;
    use chrono::{Duration, NaiveDate};

    fn settings() -> AutomationSettings {
        AutomationSettings {
            id: 1,
            baseline_temp: 28.0,
            automation_enabled: true,
            min_pump_temp: 18.0,
            max_pump_temp: 32.0,
            rolling_window_days: 7,
            low_price_ratio: 0.7,
            high_price_ratio: 1.3,
            low_temp_offset: 2.0,
            high_temp_offset: 2.0,
            absolute_shutdown_price: 1.50,
            bidding_zone: "ES".to_string(),
            updated_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn now() -> NaiveDateTime {
        date().and_hms_opt(0, 5, 0).unwrap()
    }

    fn day_price(hour: u32, total: f64) -> Price {
        let start = date().and_hms_opt(hour, 0, 0).unwrap();
        Price {
            zone: "ES".to_string(),
            start_time: start,
            end_time: start + Duration::hours(1),
            total_price: total,
            energy_price: None,
            source: "test".to_string(),
        }
    }

    fn trailing_price(days_back: i64, total: f64) -> Price {
        let start = date().and_hms_opt(12, 0, 0).unwrap() - Duration::days(days_back);
        Price {
            zone: "ES".to_string(),
            start_time: start,
            end_time: start + Duration::hours(1),
            total_price: total,
            energy_price: None,
            source: "test".to_string(),
        }
    }

    // Trailing window averaging to 0.50 €/kWh.
    fn trailing() -> Vec<Price> {
        vec![trailing_price(1, 0.40), trailing_price(2, 0.60)]
    }

    #[test]
    fn test_full_day_coverage() {
        let prices: Vec<Price> = (0..24).map(|h| day_price(h, 0.50)).collect();
        let plan = plan_day(date(), &prices, &trailing(), &settings(), now()).unwrap();

        assert_eq!(plan.entries.len(), 24);
        for (hour, entry) in plan.entries.iter().enumerate() {
            assert_eq!(entry.hour, hour as i32);
            assert_eq!(entry.for_date, date());
        }
    }

    #[test]
    fn test_no_duplicate_hours() {
        // Same hour from two sources collapses to one entry.
        let mut prices = vec![day_price(8, 0.50), day_price(9, 0.50)];
        let mut dup = day_price(8, 0.99);
        dup.source = "other".to_string();
        prices.push(dup);

        let plan = plan_day(date(), &prices, &trailing(), &settings(), now()).unwrap();
        assert_eq!(plan.entries.len(), 2);
        let first = plan.entries.iter().find(|e| e.hour == 8).unwrap();
        assert!((first.price_value - 0.50).abs() < 1e-9);
    }

    #[test]
    fn test_worked_example() {
        // Rolling average 0.50, baseline temp 28, offsets 2, shutdown 1.50.
        let prices = vec![
            day_price(0, 0.30),
            day_price(1, 0.65),
            day_price(2, 1.60),
            day_price(3, 0.50),
        ];
        let plan = plan_day(date(), &prices, &trailing(), &settings(), now()).unwrap();

        assert!((plan.average_price - 0.50).abs() < 1e-9);

        let by_hour = |h: i32| plan.entries.iter().find(|e| e.hour == h).unwrap();
        assert_eq!(by_hour(0).classification, PriceClass::Low.as_str());
        assert_eq!(by_hour(0).target_temperature, Some(30.0));
        assert_eq!(by_hour(1).classification, PriceClass::High.as_str());
        assert_eq!(by_hour(1).target_temperature, Some(26.0));
        assert_eq!(by_hour(2).classification, PriceClass::Shutdown.as_str());
        assert_eq!(by_hour(2).target_temperature, None);
        assert_eq!(by_hour(3).classification, PriceClass::Normal.as_str());
        assert_eq!(by_hour(3).target_temperature, Some(28.0));
    }

    #[test]
    fn test_temperature_null_iff_shutdown() {
        let prices: Vec<Price> = (0..24).map(|h| day_price(h, 0.10 * h as f64)).collect();
        let plan = plan_day(date(), &prices, &trailing(), &settings(), now()).unwrap();

        for entry in &plan.entries {
            let is_shutdown = entry.classification == PriceClass::Shutdown.as_str();
            assert_eq!(entry.target_temperature.is_none(), is_shutdown);
            if let Some(t) = entry.target_temperature {
                assert!(t >= 18.0 && t <= 32.0);
            }
        }
    }

    #[test]
    fn test_replanning_is_value_stable() {
        let prices: Vec<Price> = (0..24).map(|h| day_price(h, 0.40 + 0.01 * h as f64)).collect();
        let first = plan_day(date(), &prices, &trailing(), &settings(), now()).unwrap();
        let second = plan_day(date(), &prices, &trailing(), &settings(), now()).unwrap();
        assert_eq!(first.entries, second.entries);
    }

    #[test]
    fn test_disabled_automation_refuses_to_plan() {
        let mut s = settings();
        s.automation_enabled = false;
        let prices = vec![day_price(0, 0.50)];
        match plan_day(date(), &prices, &trailing(), &s, now()) {
            Err(ScheduleError::AutomationDisabled) => {}
            other => panic!("expected AutomationDisabled, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_settings_refused() {
        let mut s = settings();
        s.low_price_ratio = 1.5;
        let prices = vec![day_price(0, 0.50)];
        match plan_day(date(), &prices, &trailing(), &s, now()) {
            Err(ScheduleError::InvalidSettings(_)) => {}
            other => panic!("expected InvalidSettings, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_prices_is_an_error() {
        match plan_day(date(), &[], &trailing(), &settings(), now()) {
            Err(ScheduleError::NoPriceData(d)) => assert_eq!(d, date()),
            other => panic!("expected NoPriceData, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_trailing_window_uses_fallback_baseline() {
        use crate::services::baseline::FALLBACK_BASELINE_PRICE;
        let prices = vec![day_price(0, FALLBACK_BASELINE_PRICE)];
        let plan = plan_day(date(), &prices, &[], &settings(), now()).unwrap();
        assert_eq!(plan.average_price, FALLBACK_BASELINE_PRICE);
        assert_eq!(plan.entries[0].classification, PriceClass::Normal.as_str());
    }
}
