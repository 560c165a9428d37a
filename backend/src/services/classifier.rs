//! Hourly price classification against the rolling baseline.

use crate::models::{AutomationSettings, PriceClass};

/// Classify one hour's price. First match wins:
///
/// 1. At or above the absolute shutdown ceiling, the hour is SHUTDOWN no
///    matter what the baseline says. A globally expensive day must not pass
///    as merely "high" relative to an equally expensive week.
/// 2. At or below `baseline * low_price_ratio` the hour is LOW.
/// 3. At or above `baseline * high_price_ratio` the hour is HIGH.
/// 4. Everything else is NORMAL.
///
/// The ratios multiply the baseline, so a zero baseline is safe, and
/// negative prices classify under the same rules (a deeply negative price is
/// LOW, never SHUTDOWN).
pub fn classify(price: f64, baseline: f64, settings: &AutomationSettings) -> PriceClass {
    if price >= settings.absolute_shutdown_price {
        PriceClass::Shutdown
    } else if price <= baseline * settings.low_price_ratio {
        PriceClass::Low
    } else if price >= baseline * settings.high_price_ratio {
        PriceClass::High
    } else {
        PriceClass::Normal
    }
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
    fn test_classification_bands() {
        let s = settings();
        let baseline = 0.50;
        assert_eq!(classify(0.30, baseline, &s), PriceClass::Low);
        assert_eq!(classify(0.35, baseline, &s), PriceClass::Low); // exactly baseline * 0.7
        assert_eq!(classify(0.50, baseline, &s), PriceClass::Normal);
        assert_eq!(classify(0.65, baseline, &s), PriceClass::High); // exactly baseline * 1.3
        assert_eq!(classify(1.60, baseline, &s), PriceClass::Shutdown);
        assert_eq!(classify(1.50, baseline, &s), PriceClass::Shutdown); // ceiling inclusive
    }

    #[test]
    fn test_absolute_shutdown_wins_over_relative_bands() {
        let s = settings();
        // Baseline so high that 1.50 would otherwise be LOW.
        assert_eq!(classify(1.50, 10.0, &s), PriceClass::Shutdown);
    }

    #[test]
    fn test_zero_baseline_is_safe() {
        let s = settings();
        // With baseline 0 both thresholds collapse to 0.
        assert_eq!(classify(0.0, 0.0, &s), PriceClass::Low);
        assert_eq!(classify(0.10, 0.0, &s), PriceClass::High);
        assert_eq!(classify(-0.10, 0.0, &s), PriceClass::Low);
    }

    #[test]
    fn test_negative_prices_classify_low() {
        let s = settings();
        assert_eq!(classify(-5.0, 0.50, &s), PriceClass::Low);
        assert_eq!(classify(-1000.0, 0.50, &s), PriceClass::Low);
    }

    #[test]
    fn test_monotonic_in_price_below_shutdown() {
        let s = settings();
        let baseline = 0.50;
        // Expensiveness rank for the relative bands only.
        fn rank(class: PriceClass) -> u8 {
            match class {
                PriceClass::Low => 0,
                PriceClass::Normal => 1,
                PriceClass::High => 2,
                PriceClass::Shutdown => unreachable!("shutdown tested separately"),
            }
        }

        let mut prev = 0;
        let mut price = -1.0;
        while price < s.absolute_shutdown_price - 0.01 {
            let current = rank(classify(price, baseline, &s));
            assert!(current >= prev, "classification regressed at price {}", price);
            prev = current;
            price += 0.01;
        }
    }
}
