pub mod stock;
pub mod company;
pub mod health;

use actix_web::web;

/// 行情服务路由
pub fn market_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::market)
        .service(web::scope("/api").configure(stock::config));
}

/// 抓取服务路由
pub fn scraper_config(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::scraper)
        .service(web::scope("/company").configure(company::config));
}
