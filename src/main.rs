//! 股票信息后端服务
//!
//! 同时运行两个 HTTP 服务：
//! - 行情服务：价格历史与公司快照，数据来源 Yahoo Finance
//! - 抓取服务：通过浏览器抓取 screener.in 的公司简介与财务表格

mod config;     // 配置
mod error;      // 错误类型
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use crate::config::AppConfig;
use crate::services::browser::WebDriverEngine;
use crate::services::screener::ScreenerService;
use crate::services::stock::{MarketService, YahooClient};

fn startup_error(e: anyhow::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// 应用程序入口
#[actix_web::main]
async fn main() -> io::Result<()> {
    // 初始化日志系统，默认日志级别为 info
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::load();

    let yahoo = YahooClient::new(&config.upstream).map_err(startup_error)?;
    let market = web::Data::new(MarketService::new(Arc::new(yahoo)));

    let engine = WebDriverEngine::new(&config.browser).map_err(startup_error)?;
    let screener =
        ScreenerService::new(Arc::new(engine), &config.browser).map_err(startup_error)?;
    let screener = web::Data::new(screener);

    log::info!("启动行情服务: {}", config.market_addr());
    let mut market_server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(market.clone())
            .configure(handlers::market_config)
    });
    if config.server.workers > 0 {
        market_server = market_server.workers(config.server.workers);
    }
    let market_server = market_server.bind(config.market_addr())?.run();

    log::info!(
        "启动抓取服务: {} (WebDriver: {})",
        config.scraper_addr(),
        config.browser.webdriver_url
    );
    let mut scraper_server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(screener.clone())
            .configure(handlers::scraper_config)
    });
    if config.server.workers > 0 {
        scraper_server = scraper_server.workers(config.server.workers);
    }
    let scraper_server = scraper_server.bind(config.scraper_addr())?.run();

    futures::future::try_join(market_server, scraper_server).await?;
    Ok(())
}
