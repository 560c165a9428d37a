//! Cron Runner - Scheduled tasks for the heat pump automation service
//!
//! This binary runs as a daemon with proper cron scheduling:
//! - build-schedule: Runs at startup and daily at 00:15 (once the day's prices are in)
//! - execute-schedule: Runs every 5 minutes, acting on entries whose hour has arrived
//!
//! Environment variables:
//!   DATABASE_URL     - PostgreSQL connection string (required)
//!   DEVICE_API_URL   - Base URL of the vendor device cloud (required)
//!   DEVICE_ID        - Identifier of the managed heat pump (required)
//!   DEVICE_API_TOKEN - Bearer token for the device cloud (required)

use chrono::Local;
use std::env;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

// Import from the library crate
use backend::db::{self, DbPool};
use backend::device::{CloudHeatPumpController, DeviceController};
use backend::services::schedule_builder::ScheduleBuilder;
use backend::services::schedule_executor::ScheduleExecutor;
use backend::services::ScheduleError;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            log::error!("DATABASE_URL environment variable is not set");
            std::process::exit(1);
        }
    };

    let pool = Arc::new(db::init_pool(&database_url));

    let controller: Arc<dyn DeviceController> = match CloudHeatPumpController::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!("Starting heat pump automation cron scheduler...");

    // Build today's schedule once at startup, then run the executor so the
    // current hour is handled immediately.
    build_schedule(pool.clone());
    execute_schedule(pool.clone(), controller.clone()).await;

    // Create scheduler
    let sched = JobScheduler::new().await.expect("Failed to create scheduler");

    // Schedule build-schedule at 00:15 every day
    // Cron: "0 15 0 * * *" = second 0, minute 15, hour 0, every day
    let pool_build = pool.clone();
    let build_job = Job::new_async("0 15 0 * * *", move |_uuid, _l| {
        let pool = pool_build.clone();
        Box::pin(async move {
            log::info!("Scheduled build-schedule triggered (00:15)");
            build_schedule(pool);
        })
    })
    .expect("Failed to create build-schedule job");
    sched.add(build_job).await.expect("Failed to add build job");

    // Schedule execute-schedule every 5 minutes
    // Cron: "0 */5 * * * *" = second 0, every 5th minute
    let pool_exec = pool.clone();
    let controller_exec = controller.clone();
    let execute_job = Job::new_async("0 */5 * * * *", move |_uuid, _l| {
        let pool = pool_exec.clone();
        let controller = controller_exec.clone();
        Box::pin(async move {
            execute_schedule(pool, controller).await;
        })
    })
    .expect("Failed to create execute-schedule job");
    sched
        .add(execute_job)
        .await
        .expect("Failed to add execute job");

    // Start the scheduler
    sched.start().await.expect("Failed to start scheduler");

    log::info!("Cron scheduler running. Jobs scheduled:");
    log::info!("  - build-schedule: daily at 00:15");
    log::info!("  - execute-schedule: every 5 minutes");

    // Keep the process running
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
    }
}

/// Build today's schedule from the stored prices
fn build_schedule(pool: Arc<DbPool>) {
    let builder = ScheduleBuilder::new((*pool).clone());

    match builder.build_today() {
        Ok(outcome) => {
            log::info!(
                "Schedule built: {} entries, rolling average {:.4} €/kWh, baseline temp {:.1}°C",
                outcome.entries.len(),
                outcome.average_price,
                outcome.baseline_temp
            );
        }
        Err(ScheduleError::AutomationDisabled) => {
            log::info!("Automation is disabled, no schedule built");
        }
        Err(ScheduleError::NoPriceData(date)) => {
            // Prices may simply not be published yet; the next trigger retries.
            log::warn!("No price data for {} yet, schedule build skipped", date);
        }
        Err(e) => {
            log::error!("Schedule build failed: {}", e);
        }
    }
}

/// Run the executor over entries whose hour has arrived
async fn execute_schedule(pool: Arc<DbPool>, controller: Arc<dyn DeviceController>) {
    let executor = ScheduleExecutor::new((*pool).clone(), controller);
    let report = executor.run(Local::now().naive_local()).await;

    if report.attempted == 0 {
        return;
    }

    log::info!(
        "Executor: {} entries attempted, {} successful, {} failed",
        report.attempted,
        report.succeeded,
        report.attempted - report.succeeded
    );

    for result in report.results.iter().filter(|r| !r.success) {
        log::error!("Entry {} (hour {}) failed: {}", result.entry_id, result.hour, result.message);
    }
}
