//! Hour-by-hour schedule execution against the heat pump.
//!
//! The executor polls for unexecuted entries whose slot time has recently
//! arrived, claims each with a conditional update (the `executed` flag is
//! the single-writer gate against overlapping runs), and issues the device
//! commands. A failed entry has its claim released and stays eligible for
//! retry until it ages out of the recency window.

use crate::db::DbPool;
use crate::device::DeviceController;
use crate::models::ScheduleEntry;
use crate::schema::schedule_entries;
use crate::services::ScheduleError;
use chrono::{Duration, NaiveDateTime};
use diesel::prelude::*;
use diesel::r2d2;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

/// How long past its slot start an entry stays eligible. Long enough to
/// survive a couple of failed 5-minute executor cycles; entries older than
/// this are implicitly abandoned.
pub const EXECUTION_GRACE_MINUTES: i64 = 15;

/// Transient result of executing one entry's device commands.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryOutcome {
    pub success: bool,
    pub message: String,
    pub commands_attempted: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryResult {
    pub entry_id: i32,
    pub hour: i32,
    pub success: bool,
    pub message: String,
}

/// Aggregated outcome of one executor run. Reported, never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub results: Vec<EntryResult>,
}

/// Persistence seam for the entry state transitions. The database-backed
/// implementation expresses `claim` as a conditional update; tests swap in
/// an in-memory store to drive the claim/skip/release sequence.
trait EntryStore: Sync {
    /// Take ownership of an entry. False means another run already has it.
    fn claim(&self, entry_id: i32) -> Result<bool, ScheduleError>;

    /// Record a successful execution.
    fn finalize(&self, entry_id: i32, now: NaiveDateTime, message: &str)
        -> Result<(), ScheduleError>;

    /// Revert a failed claim so the entry is retried next cycle, keeping
    /// the failure message for the audit trail.
    fn release(&self, entry_id: i32, message: &str) -> Result<(), ScheduleError>;
}

/// An entry is due when its slot has started and started no longer than the
/// grace window ago.
pub fn is_due(slot_start: NaiveDateTime, now: NaiveDateTime) -> bool {
    slot_start <= now && now - slot_start <= Duration::minutes(EXECUTION_GRACE_MINUTES)
}

/// Select the entries an executor run should act on: unexecuted, with a
/// valid hour slot inside the recency window.
pub fn filter_due(entries: Vec<ScheduleEntry>, now: NaiveDateTime) -> Vec<ScheduleEntry> {
    entries
        .into_iter()
        .filter(|e| !e.executed)
        .filter(|e| e.slot_start().map(|slot| is_due(slot, now)).unwrap_or(false))
        .collect()
}

/// Issue the device commands for one entry.
///
/// Shutdown entries power the pump off; anything else powers it on (a
/// failure there is logged and tolerated, since a stuck power state is
/// recoverable next cycle) and then writes the target temperature, which is
/// the command that decides success.
pub async fn execute_entry(controller: &dyn DeviceController, entry: &ScheduleEntry) -> EntryOutcome {
    match entry.target_temperature {
        None => match controller.set_power(false).await {
            Ok(()) => EntryOutcome {
                success: true,
                message: "pump switched off".to_string(),
                commands_attempted: 1,
            },
            Err(e) => EntryOutcome {
                success: false,
                message: format!("power-off failed: {}", e),
                commands_attempted: 1,
            },
        },
        Some(target) => {
            let mut commands_attempted = 1;
            if let Err(e) = controller.set_power(true).await {
                warn!(
                    "Power-on failed for entry {} ({} hour {}): {} - continuing with temperature write",
                    entry.id, entry.for_date, entry.hour, e
                );
            }

            commands_attempted += 1;
            match controller.set_temperature(target).await {
                Ok(()) => EntryOutcome {
                    success: true,
                    message: format!("target temperature set to {:.1}°C", target),
                    commands_attempted,
                },
                Err(e) => EntryOutcome {
                    success: false,
                    message: format!("set_temperature failed: {}", e),
                    commands_attempted,
                },
            }
        }
    }
}

/// Claim, command and record each due entry. Entries are handled
/// independently; one failure never aborts the rest.
async fn execute_due(
    store: &dyn EntryStore,
    controller: &dyn DeviceController,
    due: Vec<ScheduleEntry>,
    now: NaiveDateTime,
) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    for entry in due {
        // Claim the entry; losing the claim means a concurrent run owns it.
        match store.claim(entry.id) {
            Ok(true) => {}
            Ok(false) => {
                info!("Entry {} already claimed by another run, skipping", entry.id);
                continue;
            }
            Err(e) => {
                log::error!("Failed to claim entry {}: {}", entry.id, e);
                continue;
            }
        }

        report.attempted += 1;
        let outcome = execute_entry(controller, &entry).await;

        if outcome.success {
            report.succeeded += 1;
            if let Err(e) = store.finalize(entry.id, now, &outcome.message) {
                log::error!("Failed to record execution of entry {}: {}", entry.id, e);
            }
        } else {
            warn!(
                "Entry {} ({} hour {}) failed: {}",
                entry.id, entry.for_date, entry.hour, outcome.message
            );
            if let Err(e) = store.release(entry.id, &outcome.message) {
                log::error!("Failed to release claim on entry {}: {}", entry.id, e);
            }
        }

        report.results.push(EntryResult {
            entry_id: entry.id,
            hour: entry.hour,
            success: outcome.success,
            message: outcome.message,
        });
    }

    report
}

/// Diesel-backed entry store. The claim is a single conditional update, so
/// two overlapping runs can never both command the device for one entry.
struct DbEntryStore {
    pool: DbPool,
}

impl DbEntryStore {
    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>, ScheduleError>
    {
        self.pool
            .get()
            .map_err(|e| ScheduleError::Persistence(format!("Database connection error: {}", e)))
    }
}

impl EntryStore for DbEntryStore {
    fn claim(&self, entry_id: i32) -> Result<bool, ScheduleError> {
        let mut conn = self.conn()?;

        let updated = diesel::update(
            schedule_entries::table
                .filter(schedule_entries::id.eq(entry_id))
                .filter(schedule_entries::executed.eq(false)),
        )
        .set(schedule_entries::executed.eq(true))
        .execute(&mut conn)?;

        Ok(updated == 1)
    }

    fn finalize(
        &self,
        entry_id: i32,
        now: NaiveDateTime,
        message: &str,
    ) -> Result<(), ScheduleError> {
        let mut conn = self.conn()?;

        diesel::update(schedule_entries::table.filter(schedule_entries::id.eq(entry_id)))
            .set((
                schedule_entries::executed_at.eq(Some(now)),
                schedule_entries::execution_result.eq(Some(message)),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    fn release(&self, entry_id: i32, message: &str) -> Result<(), ScheduleError> {
        let mut conn = self.conn()?;

        diesel::update(schedule_entries::table.filter(schedule_entries::id.eq(entry_id)))
            .set((
                schedule_entries::executed.eq(false),
                schedule_entries::executed_at.eq(None::<NaiveDateTime>),
                schedule_entries::execution_result.eq(Some(message)),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}

pub struct ScheduleExecutor {
    pool: DbPool,
    controller: Arc<dyn DeviceController>,
}

impl ScheduleExecutor {
    pub fn new(pool: DbPool, controller: Arc<dyn DeviceController>) -> Self {
        Self { pool, controller }
    }

    /// Execute all due entries.
    pub async fn run(&self, now: NaiveDateTime) -> ExecutionReport {
        let candidates = match self.load_candidates(now) {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("Failed to load due schedule entries: {}", e);
                return ExecutionReport::default();
            }
        };

        let due = filter_due(candidates, now);
        if due.is_empty() {
            return ExecutionReport::default();
        }

        info!("Executing {} due schedule entries", due.len());

        let store = DbEntryStore {
            pool: self.pool.clone(),
        };
        let report = execute_due(&store, self.controller.as_ref(), due, now).await;

        info!(
            "Executor run finished: {} attempted, {} succeeded",
            report.attempted, report.succeeded
        );
        report
    }

    /// Unexecuted entries for today and yesterday; the grace window can
    /// reach across midnight.
    fn load_candidates(&self, now: NaiveDateTime) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| ScheduleError::Persistence(format!("Database connection error: {}", e)))?;

        let today = now.date();
        let yesterday = today - Duration::days(1);

        let entries = schedule_entries::table
            .filter(schedule_entries::executed.eq(false))
            .filter(schedule_entries::for_date.ge(yesterday))
            .filter(schedule_entries::for_date.le(today))
            .order(schedule_entries::hour.asc())
            .load::<ScheduleEntry>(&mut conn)?;

        Ok(entries)
    }
}
