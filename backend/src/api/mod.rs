use actix_web::web;

pub mod prices;
pub mod schedule;
pub mod settings;

pub fn config(cfg: &mut web::ServiceConfig) {
    // Schedule planning and execution
    cfg.service(
        web::scope("/api/schedule")
            .service(schedule::build_schedule)
            .service(schedule::execute_schedule)
            .service(schedule::get_schedule),
    );

    // Price data (read-only)
    cfg.service(web::scope("/api/prices").service(prices::get_prices));

    // Automation settings
    cfg.service(
        web::scope("/api/settings")
            .service(settings::get_settings)
            .service(settings::update_settings),
    );
}
