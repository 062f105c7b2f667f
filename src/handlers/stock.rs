//! 行情接口处理器
//!
//! - GET /api/price-history/{symbol}?period=&interval= - 价格历史
//! - GET /api/company-details/{symbol} - 公司快照

use actix_web::{web, HttpResponse};
use crate::error::ServiceError;
use crate::models::PriceHistoryQuery;
use crate::services::stock::MarketService;

/// 获取价格历史
///
/// 无数据时返回 200 与说明文字，上游失败返回 500
pub async fn get_price_history(
    service: web::Data<MarketService>,
    path: web::Path<String>,
    query: web::Query<PriceHistoryQuery>,
) -> Result<HttpResponse, ServiceError> {
    let symbol = path.into_inner();
    let history = service.price_history(&symbol, &query).await?;
    Ok(HttpResponse::Ok().json(history))
}

/// 获取公司快照
///
/// 上游无该代码时返回 404
pub async fn get_company_details(
    service: web::Data<MarketService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let symbol = path.into_inner();
    let snapshot = service.company_snapshot(&symbol).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/price-history/{symbol}", web::get().to(get_price_history))
        .route("/company-details/{symbol}", web::get().to(get_company_details));
}
