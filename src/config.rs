//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 行情服务端口
    #[serde(default = "default_market_port")]
    pub market_port: u16,
    /// 抓取服务端口
    #[serde(default = "default_scraper_port")]
    pub scraper_port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 上游行情数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// K线接口
    #[serde(default = "default_chart_url")]
    pub chart_url: String,
    /// 公司概况接口
    #[serde(default = "default_quote_summary_url")]
    pub quote_summary_url: String,
    /// 获取会话 cookie 的地址
    #[serde(default = "default_cookie_url")]
    pub cookie_url: String,
    /// 获取 crumb 的地址
    #[serde(default = "default_crumb_url")]
    pub crumb_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// 浏览器抓取配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// WebDriver (chromedriver) 地址
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    /// 被抓取站点根地址
    #[serde(default = "default_site_url")]
    pub site_url: String,
    /// 等待页面元素的超时时间（秒）
    #[serde(default = "default_element_timeout")]
    pub element_timeout_secs: u64,
    /// 打开财务页面后的随机等待下限（毫秒）
    #[serde(default = "default_delay_min")]
    pub delay_min_ms: u64,
    /// 随机等待上限（毫秒）
    #[serde(default = "default_delay_max")]
    pub delay_max_ms: u64,
    /// 是否无头模式
    #[serde(default = "default_headless")]
    pub headless: bool,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 行情数据源配置
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 浏览器配置
    #[serde(default)]
    pub browser: BrowserConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_market_port() -> u16 { 5000 }
fn default_scraper_port() -> u16 { 5050 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_chart_url() -> String { "https://query1.finance.yahoo.com/v8/finance/chart".to_string() }
fn default_quote_summary_url() -> String {
    "https://query2.finance.yahoo.com/v10/finance/quoteSummary".to_string()
}
fn default_cookie_url() -> String { "https://fc.yahoo.com".to_string() }
fn default_crumb_url() -> String { "https://query1.finance.yahoo.com/v1/test/getcrumb".to_string() }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}
fn default_webdriver_url() -> String { "http://localhost:9515".to_string() }
fn default_site_url() -> String { "https://www.screener.in".to_string() }
fn default_element_timeout() -> u64 { 10 }
fn default_delay_min() -> u64 { 3000 }
fn default_delay_max() -> u64 { 7000 }
fn default_headless() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            market_port: default_market_port(),
            scraper_port: default_scraper_port(),
            workers: 0,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            chart_url: default_chart_url(),
            quote_summary_url: default_quote_summary_url(),
            cookie_url: default_cookie_url(),
            crumb_url: default_crumb_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            site_url: default_site_url(),
            element_timeout_secs: default_element_timeout(),
            delay_min_ms: default_delay_min(),
            delay_max_ms: default_delay_max(),
            headless: default_headless(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先 APP_CONFIG 指定的文件，其次默认路径，失败则使用默认值
    pub fn load() -> Self {
        let explicit = env::var("APP_CONFIG").ok();
        let config_paths = explicit
            .iter()
            .map(String::as_str)
            .chain(["config.json", "config/config.json"]);

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("使用默认配置");
        Self::default()
    }

    /// 行情服务绑定地址
    pub fn market_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.market_port)
    }

    /// 抓取服务绑定地址
    pub fn scraper_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.scraper_port)
    }
}
