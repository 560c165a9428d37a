use crate::{
    db::DbPool,
    models::SettingsUpdate,
    services::{settings, ScheduleError},
};
use actix_web::{get, put, web, HttpResponse, Responder};

/// Get the active automation settings.
#[get("")]
pub async fn get_settings(pool: web::Data<DbPool>) -> impl Responder {
    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    match settings::get_active(&mut conn) {
        Ok(active) => HttpResponse::Ok().json(active),
        Err(e) => {
            log::error!("Failed to load settings: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "message": e.to_string(),
            }))
        }
    }
}

/// Partially update the active settings. The merged record is validated
/// before anything is written.
#[put("")]
pub async fn update_settings(
    pool: web::Data<DbPool>,
    body: web::Json<SettingsUpdate>,
) -> impl Responder {
    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    match settings::update_active(&mut conn, &body) {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "settings": updated,
        })),
        Err(e @ ScheduleError::InvalidSettings(_)) => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "message": e.to_string(),
            }))
        }
        Err(e) => {
            log::error!("Failed to update settings: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "message": e.to_string(),
            }))
        }
    }
}
