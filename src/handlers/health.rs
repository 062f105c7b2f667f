use actix_web::{web, HttpResponse, Result};
use crate::models::HealthStatus;

pub async fn market_health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthStatus::ok("market")))
}

pub async fn scraper_health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthStatus::ok("scraper")))
}

pub fn market(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(market_health));
}

pub fn scraper(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(scraper_health));
}
