//! Read-only access to ingested electricity prices.
//!
//! Price ingestion itself lives elsewhere; the planner only ever queries
//! what is already stored.

use crate::db::DbPool;
use crate::models::Price;
use crate::schema::prices;
use crate::services::ScheduleError;
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

pub struct PriceStore {
    pool: DbPool,
}

impl PriceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All price points for a zone on a given date, in hour order.
    pub fn prices_for_date(&self, zone: &str, date: NaiveDate) -> Result<Vec<Price>, ScheduleError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| ScheduleError::Persistence(format!("Database connection error: {}", e)))?;

        let start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let end = date.and_hms_opt(23, 59, 59).unwrap_or_default();

        let result = prices::table
            .filter(prices::zone.eq(zone))
            .filter(prices::start_time.ge(start))
            .filter(prices::start_time.le(end))
            .order(prices::start_time.asc())
            .load::<Price>(&mut conn)?;

        Ok(result)
    }

    /// Price points for a zone with a start time inside `[from, to]`.
    pub fn prices_between(
        &self,
        zone: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Price>, ScheduleError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| ScheduleError::Persistence(format!("Database connection error: {}", e)))?;

        let result = prices::table
            .filter(prices::zone.eq(zone))
            .filter(prices::start_time.ge(from))
            .filter(prices::start_time.le(to))
            .order(prices::start_time.asc())
            .load::<Price>(&mut conn)?;

        Ok(result)
    }

    pub fn has_prices_for_date(&self, zone: &str, date: NaiveDate) -> Result<bool, ScheduleError> {
        Ok(!self.prices_for_date(zone, date)?.is_empty())
    }
}
