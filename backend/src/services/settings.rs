//! Access and validation for the active automation settings record.

use crate::models::{AutomationSettings, SettingsUpdate};
use crate::schema::automation_settings;
use crate::services::ScheduleError;
use chrono::Local;
use diesel::prelude::*;

/// A rolling baseline longer than a year has no planning value and oversized
/// windows would overflow the trailing-window arithmetic.
pub const MAX_ROLLING_WINDOW_DAYS: i32 = 365;

/// Load the active settings record (the newest row).
pub fn get_active(conn: &mut PgConnection) -> Result<AutomationSettings, ScheduleError> {
    automation_settings::table
        .order(automation_settings::id.desc())
        .first::<AutomationSettings>(conn)
        .optional()?
        .ok_or_else(|| ScheduleError::InvalidSettings("no automation settings configured".to_string()))
}

/// Check the invariants that make the planner well-defined.
pub fn validate(settings: &AutomationSettings) -> Result<(), String> {
    if settings.min_pump_temp >= settings.max_pump_temp {
        return Err(format!(
            "min_pump_temp ({}) must be below max_pump_temp ({})",
            settings.min_pump_temp, settings.max_pump_temp
        ));
    }
    if settings.low_price_ratio >= 1.0 {
        return Err(format!(
            "low_price_ratio ({}) must be below 1.0",
            settings.low_price_ratio
        ));
    }
    if settings.high_price_ratio <= 1.0 {
        return Err(format!(
            "high_price_ratio ({}) must be above 1.0",
            settings.high_price_ratio
        ));
    }
    if !(1..=MAX_ROLLING_WINDOW_DAYS).contains(&settings.rolling_window_days) {
        return Err(format!(
            "rolling_window_days ({}) must be between 1 and {}",
            settings.rolling_window_days, MAX_ROLLING_WINDOW_DAYS
        ));
    }
    if settings.absolute_shutdown_price <= 0.0 {
        return Err(format!(
            "absolute_shutdown_price ({}) must be positive",
            settings.absolute_shutdown_price
        ));
    }
    if settings.low_temp_offset < 0.0 || settings.high_temp_offset < 0.0 {
        return Err("temperature offsets must not be negative".to_string());
    }
    Ok(())
}

/// Apply a partial update to the active record, validating the merged result
/// before anything is written.
pub fn update_active(
    conn: &mut PgConnection,
    changes: &SettingsUpdate,
) -> Result<AutomationSettings, ScheduleError> {
    let current = get_active(conn)?;

    let merged = AutomationSettings {
        baseline_temp: changes.baseline_temp.unwrap_or(current.baseline_temp),
        automation_enabled: changes.automation_enabled.unwrap_or(current.automation_enabled),
        min_pump_temp: changes.min_pump_temp.unwrap_or(current.min_pump_temp),
        max_pump_temp: changes.max_pump_temp.unwrap_or(current.max_pump_temp),
        rolling_window_days: changes.rolling_window_days.unwrap_or(current.rolling_window_days),
        low_price_ratio: changes.low_price_ratio.unwrap_or(current.low_price_ratio),
        high_price_ratio: changes.high_price_ratio.unwrap_or(current.high_price_ratio),
        low_temp_offset: changes.low_temp_offset.unwrap_or(current.low_temp_offset),
        high_temp_offset: changes.high_temp_offset.unwrap_or(current.high_temp_offset),
        absolute_shutdown_price: changes
            .absolute_shutdown_price
            .unwrap_or(current.absolute_shutdown_price),
        bidding_zone: changes
            .bidding_zone
            .clone()
            .unwrap_or_else(|| current.bidding_zone.clone()),
        ..current.clone()
    };

    validate(&merged).map_err(ScheduleError::InvalidSettings)?;

    let now = Local::now().naive_local();
    let updated = diesel::update(
        automation_settings::table.filter(automation_settings::id.eq(current.id)),
    )
    .set((changes, automation_settings::updated_at.eq(now)))
    .get_result::<AutomationSettings>(conn)?;

    log::info!("Automation settings updated (id={})", updated.id);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

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

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate(&settings()).is_ok());
    }

    #[test]
    fn test_inverted_temp_bounds_rejected() {
        let mut s = settings();
        s.min_pump_temp = 32.0;
        s.max_pump_temp = 18.0;
        assert!(validate(&s).unwrap_err().contains("min_pump_temp"));
    }

    #[test]
    fn test_equal_temp_bounds_rejected() {
        let mut s = settings();
        s.min_pump_temp = 25.0;
        s.max_pump_temp = 25.0;
        assert!(validate(&s).is_err());
    }

    #[test]
    fn test_low_ratio_must_be_below_one() {
        let mut s = settings();
        s.low_price_ratio = 1.0;
        assert!(validate(&s).unwrap_err().contains("low_price_ratio"));
    }

    #[test]
    fn test_high_ratio_must_be_above_one() {
        let mut s = settings();
        s.high_price_ratio = 0.9;
        assert!(validate(&s).unwrap_err().contains("high_price_ratio"));
    }

    #[test]
    fn test_window_days_must_be_positive() {
        let mut s = settings();
        s.rolling_window_days = 0;
        assert!(validate(&s).is_err());
    }

    #[test]
    fn test_window_days_capped_at_one_year() {
        let mut s = settings();
        s.rolling_window_days = MAX_ROLLING_WINDOW_DAYS;
        assert!(validate(&s).is_ok());

        s.rolling_window_days = MAX_ROLLING_WINDOW_DAYS + 1;
        assert!(validate(&s).unwrap_err().contains("rolling_window_days"));

        // A value large enough to overflow date arithmetic must be rejected
        // here, before any planning run touches it.
        s.rolling_window_days = 2_000_000_000;
        assert!(validate(&s).is_err());
    }

    #[test]
    fn test_negative_offsets_rejected() {
        let mut s = settings();
        s.low_temp_offset = -1.0;
        assert!(validate(&s).is_err());
    }
}
