//! 网页抓取接口处理器
//!
//! - GET /company/about/{symbol} - 公司名称与简介
//! - GET /company/financials/{symbol} - 财务表格分组
//!
//! 抓取失败写在响应体的 error 字段中，状态码仍为 200；
//! 只有浏览器会话无法创建时返回 500。

use actix_web::{web, HttpResponse};
use crate::error::ServiceError;
use crate::services::screener::ScreenerService;

pub async fn get_company_about(
    service: web::Data<ScreenerService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let symbol = path.into_inner();
    let about = service.about(&symbol).await?;
    Ok(HttpResponse::Ok().json(about))
}

pub async fn get_company_financials(
    service: web::Data<ScreenerService>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let symbol = path.into_inner();
    let financials = service.financials(&symbol).await?;
    Ok(HttpResponse::Ok().json(financials))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/about/{symbol}", web::get().to(get_company_about))
        .route("/financials/{symbol}", web::get().to(get_company_financials));
}
