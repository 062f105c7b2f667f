//! W3C WebDriver 客户端
//!
//! 通过 chromedriver 的 HTTP 接口驱动无头 Chrome：
//! - POST   /session                      创建会话
//! - POST   /session/{id}/url             打开页面
//! - POST   /session/{id}/elements        查找元素
//! - GET    /session/{id}/element/{e}/text 元素文本
//! - GET    /session/{id}/source          页面源码
//! - DELETE /session/{id}                 关闭会话

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::{Client, RequestBuilder};
use scraper::{Html, Selector};
use serde_json::{json, Value};
use tokio::time::Instant;
use url::Url;

use crate::config::BrowserConfig;
use crate::error::ServiceError;

use super::{BrowserEngine, BrowserSession};

/// W3C 规范中元素引用的键名
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
/// 单条命令超时（含页面加载）
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);
/// 轮询元素的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 常见桌面浏览器 UA，每个会话随机取一个
const USER_AGENTS: [&str; 6] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

/// 随机选择 UA
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// WebDriver 引擎
pub struct WebDriverEngine {
    client: Client,
    /// chromedriver 地址（不带结尾斜杠）
    base_url: String,
    headless: bool,
}

impl WebDriverEngine {
    pub fn new(config: &BrowserConfig) -> Result<Self> {
        Url::parse(&config.webdriver_url)?;
        let client = Client::builder().timeout(COMMAND_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: config.webdriver_url.trim_end_matches('/').to_string(),
            headless: config.headless,
        })
    }

    /// 会话能力：降低自动化特征
    fn capabilities(&self, user_agent: &str) -> Value {
        let mut args = vec![
            format!("--user-agent={}", user_agent),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": args,
                        "excludeSwitches": ["enable-automation"],
                        "useAutomationExtension": false
                    }
                }
            }
        })
    }
}

#[async_trait]
impl BrowserEngine for WebDriverEngine {
    async fn new_session(&self) -> Result<Box<dyn BrowserSession>, ServiceError> {
        let user_agent = random_user_agent();
        let request = self
            .client
            .post(format!("{}/session", self.base_url))
            .json(&self.capabilities(user_agent));

        let value = execute(request).await.map_err(ServiceError::browser)?;
        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| ServiceError::browser("WebDriver 未返回 sessionId"))?;

        log::debug!("创建浏览器会话 {} UA={}", session_id, user_agent);

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.base_url, session_id),
        }))
    }
}

/// 单个 WebDriver 会话
struct WebDriverSession {
    client: Client,
    session_url: String,
}

impl WebDriverSession {
    async fn find_elements(&self, selector: &str) -> Result<Vec<String>> {
        let request = self
            .client
            .post(format!("{}/elements", self.session_url))
            .json(&json!({"using": "css selector", "value": selector}));

        let value = execute(request).await?;
        Ok(element_ids(&value))
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ServiceError> {
        log::debug!("📡 打开页面: {}", url);
        let request = self
            .client
            .post(format!("{}/url", self.session_url))
            .json(&json!({ "url": url }));

        execute(request).await.map_err(ServiceError::browser)?;
        Ok(())
    }

    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), ServiceError> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self
                .find_elements(selector)
                .await
                .map_err(ServiceError::browser)?;
            if !found.is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ServiceError::ElementTimeout {
                    selector: selector.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn extract_text(&mut self, selector: &str) -> Result<Option<String>, ServiceError> {
        let ids = self
            .find_elements(selector)
            .await
            .map_err(ServiceError::browser)?;
        let Some(id) = ids.first() else {
            return Ok(None);
        };

        let request = self
            .client
            .get(format!("{}/element/{}/text", self.session_url, id));
        let value = execute(request).await.map_err(ServiceError::browser)?;

        Ok(value.as_str().map(|text| text.trim().to_string()))
    }

    async fn extract_table_rows(
        &mut self,
        row_selector: &str,
        cell_selector: &str,
    ) -> Result<Vec<Vec<String>>, ServiceError> {
        let request = self.client.get(format!("{}/source", self.session_url));
        let value = execute(request).await.map_err(ServiceError::browser)?;
        let html = value
            .as_str()
            .ok_or_else(|| ServiceError::browser("WebDriver 未返回页面源码"))?;

        parse_table_rows(html, row_selector, cell_selector)
    }

    async fn close(self: Box<Self>) -> Result<(), ServiceError> {
        execute(self.client.delete(&self.session_url))
            .await
            .map_err(ServiceError::browser)?;
        log::debug!("关闭浏览器会话 {}", self.session_url);
        Ok(())
    }
}

/// 发送命令并取出响应中的 `value` 字段
async fn execute(request: RequestBuilder) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    let mut body: Value = response.json().await?;

    if !status.is_success() {
        let error = body["value"]["error"].as_str().unwrap_or("unknown error");
        let message = body["value"]["message"].as_str().unwrap_or_default();
        return Err(anyhow!("WebDriver {} {}: {}", status, error, message));
    }

    Ok(body.get_mut("value").map(Value::take).unwrap_or(Value::Null))
}

/// 从 `/elements` 响应中提取元素引用
fn element_ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item[ELEMENT_KEY].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// 解析页面中的表格行，单元格文本合并连续空白
pub fn parse_table_rows(
    html: &str,
    row_selector: &str,
    cell_selector: &str,
) -> Result<Vec<Vec<String>>, ServiceError> {
    let row_sel = Selector::parse(row_selector)
        .map_err(|e| ServiceError::browser(format!("无效的选择器 {}: {:?}", row_selector, e)))?;
    let cell_sel = Selector::parse(cell_selector)
        .map_err(|e| ServiceError::browser(format!("无效的选择器 {}: {:?}", cell_selector, e)))?;

    let document = Html::parse_document(html);
    let rows = document
        .select(&row_sel)
        .map(|row| {
            row.select(&cell_sel)
                .map(|cell| {
                    cell.text()
                        .flat_map(str::split_whitespace)
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect()
        })
        .collect();

    Ok(rows)
}
