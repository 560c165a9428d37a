//! Target temperature planning for a classified hour.

use crate::models::{AutomationSettings, PriceClass};

/// The planned decision for one hour: either a clamped target temperature or
/// an explicit shutdown, plus a human-readable reason for the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDecision {
    pub target_temperature: Option<f64>,
    pub shutdown: bool,
    pub reason: String,
}

/// Map a classification to a target temperature.
///
/// LOW hours heat harder, HIGH hours back off, NORMAL hours hold the
/// baseline temperature. The result is clamped to
/// `[min_pump_temp, max_pump_temp]` in every branch, since `baseline_temp`
/// itself may be out of range after a settings change.
pub fn plan(
    classification: PriceClass,
    baseline_temp: f64,
    price: f64,
    settings: &AutomationSettings,
) -> PlanDecision {
    match classification {
        PriceClass::Shutdown => PlanDecision {
            target_temperature: None,
            shutdown: true,
            reason: format!(
                "price {:.4} €/kWh at or above shutdown ceiling {:.4}, classified shutdown, turning pump off",
                price, settings.absolute_shutdown_price
            ),
        },
        PriceClass::Low => {
            let target = clamp(baseline_temp + settings.low_temp_offset, settings);
            PlanDecision {
                target_temperature: Some(target),
                shutdown: false,
                reason: format!(
                    "price {:.4} €/kWh classified low, raising target by {:.1}°C to {:.1}°C",
                    price, settings.low_temp_offset, target
                ),
            }
        }
        PriceClass::High => {
            let target = clamp(baseline_temp - settings.high_temp_offset, settings);
            PlanDecision {
                target_temperature: Some(target),
                shutdown: false,
                reason: format!(
                    "price {:.4} €/kWh classified high, lowering target by {:.1}°C to {:.1}°C",
                    price, settings.high_temp_offset, target
                ),
            }
        }
        PriceClass::Normal => {
            let target = clamp(baseline_temp, settings);
            PlanDecision {
                target_temperature: Some(target),
                shutdown: false,
                reason: format!(
                    "price {:.4} €/kWh classified normal, holding target at {:.1}°C",
                    price, target
                ),
            }
        }
    }
}

fn clamp(temp: f64, settings: &AutomationSettings) -> f64 {
    temp.max(settings.min_pump_temp).min(settings.max_pump_temp)
}
