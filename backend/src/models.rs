use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One hour of ingested electricity price data for a bidding zone.
/// Immutable once stored; this crate only reads it.
#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::prices)]
pub struct Price {
    pub zone: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub total_price: f64,
    pub energy_price: Option<f64>,
    pub source: String,
}

/// Per-installation automation configuration. The newest row is the active one.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::automation_settings)]
pub struct AutomationSettings {
    pub id: i32,
    pub baseline_temp: f64,
    pub automation_enabled: bool,
    pub min_pump_temp: f64,
    pub max_pump_temp: f64,
    pub rolling_window_days: i32,
    pub low_price_ratio: f64,
    pub high_price_ratio: f64,
    pub low_temp_offset: f64,
    pub high_temp_offset: f64,
    pub absolute_shutdown_price: f64,
    pub bidding_zone: String,
    pub updated_at: NaiveDateTime,
}

/// Partial settings update coming from the API. Absent fields are left untouched.
#[derive(AsChangeset, Deserialize, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::automation_settings)]
pub struct SettingsUpdate {
    pub baseline_temp: Option<f64>,
    pub automation_enabled: Option<bool>,
    pub min_pump_temp: Option<f64>,
    pub max_pump_temp: Option<f64>,
    pub rolling_window_days: Option<i32>,
    pub low_price_ratio: Option<f64>,
    pub high_price_ratio: Option<f64>,
    pub low_temp_offset: Option<f64>,
    pub high_temp_offset: Option<f64>,
    pub absolute_shutdown_price: Option<f64>,
    pub bidding_zone: Option<String>,
}

/// Price classification of one hour relative to the rolling baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceClass {
    Shutdown,
    Low,
    Normal,
    High,
}

impl PriceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceClass::Shutdown => "shutdown",
            PriceClass::Low => "low",
            PriceClass::Normal => "normal",
            PriceClass::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<PriceClass> {
        match s {
            "shutdown" => Some(PriceClass::Shutdown),
            "low" => Some(PriceClass::Low),
            "normal" => Some(PriceClass::Normal),
            "high" => Some(PriceClass::High),
            _ => None,
        }
    }
}

/// One hour's planned decision for the heat pump. Unique per (for_date, hour).
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::schedule_entries)]
pub struct ScheduleEntry {
    pub id: i32,
    pub for_date: NaiveDate,
    pub hour: i32,
    pub price_value: f64,
    pub classification: String,
    pub target_temperature: Option<f64>,
    pub reason: String,
    pub executed: bool,
    pub executed_at: Option<NaiveDateTime>,
    pub execution_result: Option<String>,
}

impl ScheduleEntry {
    /// Wall-clock start of this entry's hour slot. None if the stored hour is out of range.
    pub fn slot_start(&self) -> Option<NaiveDateTime> {
        self.for_date.and_hms_opt(self.hour as u32, 0, 0)
    }
}

#[derive(Insertable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::schedule_entries)]
pub struct NewScheduleEntry {
    pub for_date: NaiveDate,
    pub hour: i32,
    pub price_value: f64,
    pub classification: String,
    pub target_temperature: Option<f64>,
    pub reason: String,
}
