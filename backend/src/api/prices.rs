use crate::{
    db::DbPool,
    services::{price_store::PriceStore, settings},
};
use actix_web::{get, web, HttpResponse, Responder};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct PriceQuery {
    pub date: Option<String>, // Format: YYYY-MM-DD
}

#[derive(Serialize)]
pub struct PriceRow {
    pub start_time: String,
    pub end_time: String,
    pub total_price: f64,
    pub energy_price: Option<f64>,
    pub source: String,
    pub price_formatted: String,
}

/// Get stored price points for the configured bidding zone on a date.
#[get("")]
pub async fn get_prices(pool: web::Data<DbPool>, query: web::Query<PriceQuery>) -> impl Responder {
    let date = match &query.date {
        Some(d) => match NaiveDate::parse_from_str(d, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                return HttpResponse::BadRequest().body("Invalid date format. Use YYYY-MM-DD")
            }
        },
        None => Local::now().date_naive(),
    };

    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(_) => return HttpResponse::InternalServerError().body("Database connection error"),
    };

    let active = match settings::get_active(&mut conn) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to load settings: {}", e);
            return HttpResponse::InternalServerError().body("Error loading settings");
        }
    };

    let store = PriceStore::new(pool.get_ref().clone());
    let prices = match store.prices_for_date(&active.bidding_zone, date) {
        Ok(p) => p,
        Err(e) => {
            log::error!("Error fetching prices: {}", e);
            return HttpResponse::InternalServerError().body("Error fetching prices");
        }
    };

    let rows: Vec<PriceRow> = prices
        .into_iter()
        .map(|p| PriceRow {
            start_time: p.start_time.to_string(),
            end_time: p.end_time.to_string(),
            price_formatted: format!("{:.4} €/kWh", p.total_price),
            total_price: p.total_price,
            energy_price: p.energy_price,
            source: p.source,
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "date": date.to_string(),
        "zone": active.bidding_zone,
        "prices": rows,
    }))
}
