//! 业务逻辑服务模块
//!
//! 封装数据获取和处理逻辑

pub mod browser;   // 浏览器自动化
pub mod screener;  // 网页抓取服务
pub mod stock;     // 股票数据服务
