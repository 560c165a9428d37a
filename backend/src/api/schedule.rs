use crate::{
    db::DbPool,
    device::DeviceController,
    models::ScheduleEntry,
    schema::schedule_entries,
    services::{
        schedule_builder::ScheduleBuilder, schedule_executor::ScheduleExecutor, ScheduleError,
    },
};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{Local, NaiveDate};
use diesel::prelude::*;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ScheduleQuery {
    pub date: Option<String>, // Format: YYYY-MM-DD
}

/// Trigger the schedule builder for today, replacing any prior schedule.
#[post("")]
pub async fn build_schedule(pool: web::Data<DbPool>) -> impl Responder {
    let builder = ScheduleBuilder::new(pool.get_ref().clone());

    match builder.build_today() {
        Ok(outcome) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "schedule_entries": outcome.entries,
            "average_price": outcome.average_price,
            "baseline_temp": outcome.baseline_temp,
        })),
        Err(ScheduleError::AutomationDisabled) => HttpResponse::Ok().json(serde_json::json!({
            "success": false,
            "message": "Automation is disabled, nothing to do",
            "schedule_entries": [],
        })),
        Err(e @ ScheduleError::NoPriceData(_)) => {
            HttpResponse::Conflict().json(serde_json::json!({
                "success": false,
                "message": e.to_string(),
            }))
        }
        Err(e @ ScheduleError::InvalidSettings(_)) => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "message": e.to_string(),
            }))
        }
        Err(e) => {
            log::error!("Schedule build failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "message": e.to_string(),
            }))
        }
    }
}

/// Trigger one executor pass over the due entries.
#[post("/execute")]
pub async fn execute_schedule(
    pool: web::Data<DbPool>,
    controller: web::Data<dyn DeviceController>,
) -> impl Responder {
    let executor = ScheduleExecutor::new(pool.get_ref().clone(), controller.into_inner());
    let report = executor.run(Local::now().naive_local()).await;

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "attempted": report.attempted,
        "succeeded": report.succeeded,
        "results": report.results,
    }))
}

/// Get the persisted schedule entries for a date (default today), hour order.
#[get("")]
pub async fn get_schedule(
    pool: web::Data<DbPool>,
    query: web::Query<ScheduleQuery>,
) -> impl Responder {
    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    let date = match &query.date {
        Some(d) => match NaiveDate::parse_from_str(d, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                return HttpResponse::BadRequest().body("Invalid date format. Use YYYY-MM-DD")
            }
        },
        None => Local::now().date_naive(),
    };

    let entries: Vec<ScheduleEntry> = match schedule_entries::table
        .filter(schedule_entries::for_date.eq(date))
        .order(schedule_entries::hour.asc())
        .load(&mut conn)
    {
        Ok(e) => e,
        Err(e) => {
            log::error!("Error fetching schedule entries: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching schedule");
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "date": date.to_string(),
        "schedule_entries": entries,
    }))
}
