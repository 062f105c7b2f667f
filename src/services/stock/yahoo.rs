//! Yahoo Finance 数据源
//!
//! - K线: /v8/finance/chart/<symbol>?range=&interval=
//! - 公司信息: /v10/finance/quoteSummary/<symbol>，需要先拿会话 cookie 和 crumb

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use chrono_tz::Tz;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::UpstreamConfig;
use crate::models::{Bar, CompanyMetadata};

use super::MarketDataSource;

/// quoteSummary 请求的模块
const SUMMARY_MODULES: &str = "price,summaryDetail,assetProfile";
/// 上游对未知代码返回的错误码
const NOT_FOUND_CODE: &str = "Not Found";

/// Yahoo 客户端
pub struct YahooClient {
    /// HTTP 客户端（带 cookie 存储）
    client: Client,
    chart_url: String,
    quote_summary_url: String,
    cookie_url: String,
    crumb_url: String,
}

impl YahooClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            chart_url: config.chart_url.clone(),
            quote_summary_url: config.quote_summary_url.clone(),
            cookie_url: config.cookie_url.clone(),
            crumb_url: config.crumb_url.clone(),
        })
    }

    /// 获取 crumb，每次请求都重新握手
    async fn fetch_crumb(&self) -> Result<String> {
        // 该地址通常返回 404，只用来写入会话 cookie
        self.client
            .get(&self.cookie_url)
            .header("Referer", "https://finance.yahoo.com/")
            .send()
            .await?;

        let response = self
            .client
            .get(&self.crumb_url)
            .header("Referer", "https://finance.yahoo.com/")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("获取 crumb 失败: {}", response.status()));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.len() > 100 || crumb.contains(' ') || crumb.contains('<') {
            return Err(anyhow!("上游返回了无效的 crumb"));
        }
        Ok(crumb)
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn fetch_series(&self, symbol: &str, range: &str, interval: &str) -> Result<Vec<Bar>> {
        let url = endpoint(&self.chart_url, symbol)?;
        log::debug!("📡 请求K线 URL: {} range={} interval={}", url, range, interval);

        let response = self
            .client
            .get(url)
            .query(&[("range", chart_range(range)), ("interval", interval)])
            .send()
            .await?;

        // 未知代码时上游返回 404 + JSON 错误体，交给解析逻辑判断
        let status = response.status();
        let body = response.text().await?;
        parse_chart(&body).map_err(|e| status_error("获取K线数据失败", status, e))
    }

    async fn fetch_metadata(&self, symbol: &str) -> Result<Option<CompanyMetadata>> {
        let crumb = self.fetch_crumb().await?;
        let url = endpoint(&self.quote_summary_url, symbol)?;
        log::debug!("📡 请求公司信息 URL: {}", url);

        let response = self
            .client
            .get(url)
            .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_quote_summary(&body).map_err(|e| status_error("获取公司信息失败", status, e))
    }
}

/// 非 2xx 响应的错误
///
/// 响应体能解析出上游错误时原样保留，只有无法解析时才退回状态行
fn status_error(context: &str, status: StatusCode, error: anyhow::Error) -> anyhow::Error {
    if status.is_success() || error.downcast_ref::<serde_json::Error>().is_none() {
        error
    } else {
        anyhow!("{}: {}", context, status)
    }
}

/// 在基础地址后追加代码路径段（自动转义）
fn endpoint(base: &str, symbol: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("无效的基础地址: {}", base))?
        .pop_if_empty()
        .push(symbol);
    Ok(url)
}

/// 上游不接受 1w，用 5d 代替
fn chart_range(range: &str) -> &str {
    match range {
        "1w" => "5d",
        other => other,
    }
}

// ==================== K线响应 ====================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// 解析K线响应，收盘价缺失的行直接跳过
fn parse_chart(body: &str) -> Result<Vec<Bar>> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        if error.code == NOT_FOUND_CODE {
            log::warn!("上游没有该代码的K线: {}", error.description);
            return Ok(Vec::new());
        }
        return Err(anyhow!("K线接口返回错误 {}: {}", error.code, error.description));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(close) = quote.close.get(i).copied().flatten() else {
            continue;
        };
        let timestamp = to_exchange_time(ts, &result.meta)
            .ok_or_else(|| anyhow!("无效的时间戳: {}", ts))?;

        bars.push(Bar {
            timestamp,
            high: quote.high.get(i).copied().flatten().unwrap_or(close),
            low: quote.low.get(i).copied().flatten().unwrap_or(close),
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0) as u64,
        });
    }

    Ok(bars)
}

/// Unix 时间戳转交易所当地时间，时区名无法识别时退回固定偏移
fn to_exchange_time(ts: i64, meta: &ChartMeta) -> Option<NaiveDateTime> {
    let utc = DateTime::from_timestamp(ts, 0)?;

    if let Some(tz) = meta
        .exchange_timezone_name
        .as_deref()
        .and_then(|name| name.parse::<Tz>().ok())
    {
        return Some(utc.with_timezone(&tz).naive_local());
    }

    let offset = FixedOffset::east_opt(i32::try_from(meta.gmtoffset).ok()?)?;
    Some(utc.with_timezone(&offset).naive_local())
}

// ==================== 公司信息响应 ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    summary_detail: Option<SummaryDetailModule>,
    #[serde(default)]
    asset_profile: Option<AssetProfileModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    previous_close: Option<YahooNumber>,
    volume: Option<YahooNumber>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<YahooNumber>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetProfileModule {
    long_business_summary: Option<String>,
}

/// 上游数值字段格式 `{"raw": 1.23, "fmt": "1.23"}`，raw 偶尔是 "Infinity"
#[derive(Debug, Default, Deserialize)]
struct YahooNumber {
    #[serde(default)]
    raw: Option<Value>,
}

impl YahooNumber {
    fn value(&self) -> Option<f64> {
        self.raw.as_ref().and_then(Value::as_f64)
    }
}

fn parse_quote_summary(body: &str) -> Result<Option<CompanyMetadata>> {
    let response: QuoteSummaryResponse = serde_json::from_str(body)?;

    if let Some(error) = response.quote_summary.error {
        if error.code == NOT_FOUND_CODE {
            return Ok(None);
        }
        return Err(anyhow!("公司信息接口返回错误 {}: {}", error.code, error.description));
    }

    let Some(result) = response.quote_summary.result.and_then(|r| r.into_iter().next()) else {
        return Ok(None);
    };

    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let profile = result.asset_profile.unwrap_or_default();
    let number = |field: &Option<YahooNumber>| field.as_ref().and_then(YahooNumber::value);

    let metadata = CompanyMetadata {
        long_name: price.long_name,
        long_business_summary: profile.long_business_summary,
        previous_close: number(&detail.previous_close),
        volume: number(&detail.volume).map(|v| v as u64),
        trailing_pe: number(&detail.trailing_pe),
    };

    Ok((!metadata.is_empty()).then_some(metadata))
}
