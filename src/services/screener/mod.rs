//! 公司信息网页抓取服务
//!
//! 每个请求打开一个新的浏览器会话，抓取完成后无条件关闭

pub mod about;
pub mod financials;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use rand::Rng;
use url::Url;

use crate::config::BrowserConfig;
use crate::error::ServiceError;
use crate::models::{FinancialsOutcome, ScrapedAbout};
use crate::services::browser::{with_session, BrowserEngine};

pub use about::scrape_about;
pub use financials::scrape_financials;

/// 抓取服务
#[derive(Clone)]
pub struct ScreenerService {
    engine: Arc<dyn BrowserEngine>,
    site_url: Url,
    element_timeout: Duration,
    delay_min_ms: u64,
    delay_max_ms: u64,
}

impl ScreenerService {
    pub fn new(engine: Arc<dyn BrowserEngine>, config: &BrowserConfig) -> Result<Self> {
        let site_url = Url::parse(&config.site_url)?;
        if site_url.cannot_be_a_base() {
            return Err(anyhow!("无效的站点地址: {}", config.site_url));
        }

        let (delay_min_ms, delay_max_ms) = if config.delay_min_ms <= config.delay_max_ms {
            (config.delay_min_ms, config.delay_max_ms)
        } else {
            (config.delay_max_ms, config.delay_min_ms)
        };

        Ok(Self {
            engine,
            site_url,
            element_timeout: Duration::from_secs(config.element_timeout_secs),
            delay_min_ms,
            delay_max_ms,
        })
    }

    /// 公司页面地址，如 https://www.screener.in/company/TCS/consolidated/
    fn company_url(&self, symbol: &str, consolidated: bool) -> String {
        let mut url = self.site_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("company").push(symbol);
            if consolidated {
                segments.push("consolidated");
            }
            // 结尾斜杠
            segments.push("");
        }
        url.to_string()
    }

    fn random_delay(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.delay_min_ms..=self.delay_max_ms);
        Duration::from_millis(ms)
    }

    /// 抓取公司简介
    pub async fn about(&self, symbol: &str) -> Result<ScrapedAbout, ServiceError> {
        let url = self.company_url(symbol, false);
        let timeout = self.element_timeout;

        with_session(self.engine.as_ref(), move |session| {
            Box::pin(async move { scrape_about(session, &url, timeout).await })
        })
        .await
    }

    /// 抓取财务表格
    pub async fn financials(&self, symbol: &str) -> Result<FinancialsOutcome, ServiceError> {
        let url = self.company_url(symbol, true);
        let timeout = self.element_timeout;
        let delay = self.random_delay();

        with_session(self.engine.as_ref(), move |session| {
            Box::pin(async move { scrape_financials(session, &url, delay, timeout).await })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::about::{ABOUT_SELECTOR, NAME_SELECTOR};
    use super::financials::TABLE_SELECTOR;
    use super::*;
    use crate::models::{NOT_APPLICABLE, NOT_AVAILABLE};
    use crate::services::browser::testing::{FakeEngine, FakePage};

    fn config() -> BrowserConfig {
        BrowserConfig {
            delay_min_ms: 0,
            delay_max_ms: 0,
            element_timeout_secs: 1,
            ..BrowserConfig::default()
        }
    }

    fn service(engine: &Arc<FakeEngine>) -> ScreenerService {
        ScreenerService::new(engine.clone(), &config()).unwrap()
    }

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_company_url() {
        let engine = Arc::new(FakeEngine::default());
        let svc = service(&engine);
        assert_eq!(svc.company_url("TCS", false), "https://www.screener.in/company/TCS/");
        assert_eq!(
            svc.company_url("M&M", true),
            "https://www.screener.in/company/M&M/consolidated/"
        );
    }

    #[test]
    fn test_delay_bounds_are_ordered() {
        let engine = Arc::new(FakeEngine::default());
        let config = BrowserConfig {
            delay_min_ms: 50,
            delay_max_ms: 10,
            ..BrowserConfig::default()
        };
        let svc = ScreenerService::new(engine, &config).unwrap();
        for _ in 0..20 {
            let d = svc.random_delay().as_millis();
            assert!((10..=50).contains(&d));
        }
    }

    #[actix_web::test]
    async fn test_about_success() {
        let engine = Arc::new(FakeEngine::new(
            FakePage::default()
                .with_element(NAME_SELECTOR, "  Tata Consultancy Services Ltd ")
                .with_element(ABOUT_SELECTOR, "TCS is an IT services company."),
        ));

        let about = service(&engine).about("TCS").await.unwrap();
        assert_eq!(about.company_name, "Tata Consultancy Services Ltd");
        assert_eq!(about.about, "TCS is an IT services company.");
        assert!(about.error.is_none());
        assert_eq!(
            engine.visited.lock().unwrap().as_slice(),
            ["https://www.screener.in/company/TCS/"]
        );
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_about_missing_description() {
        let engine = Arc::new(FakeEngine::new(
            FakePage::default().with_element(NAME_SELECTOR, "Infosys Ltd"),
        ));

        let about = service(&engine).about("INFY").await.unwrap();
        assert_eq!(about.company_name, "Infosys Ltd");
        assert_eq!(about.about, NOT_AVAILABLE);
        assert!(about.error.is_none());
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_about_name_timeout() {
        let engine = Arc::new(FakeEngine::new(FakePage::default()));

        let about = service(&engine).about("NOPE").await.unwrap();
        assert_eq!(about.company_name, NOT_APPLICABLE);
        assert_eq!(about.about, NOT_APPLICABLE);
        assert!(about.error.unwrap().contains(NAME_SELECTOR));
        assert_eq!(engine.opened(), 1);
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_about_navigation_failure() {
        let engine = Arc::new(FakeEngine::new(FakePage {
            fail_navigate: true,
            ..Default::default()
        }));

        let about = service(&engine).about("TCS").await.unwrap();
        assert!(about.error.is_some());
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_financials_success() {
        let engine = Arc::new(FakeEngine::new(FakePage {
            rows: Some(rows(&[
                &["Sales +", "1,000", "1,100"],
                &["Total Liabilities", "9,000"],
                &["Net Cash Flow", "120"],
                &["Face Value", "1"],
            ])),
            ..FakePage::default().with_element(TABLE_SELECTOR, "")
        }));

        let outcome = service(&engine).financials("TCS").await.unwrap();
        let FinancialsOutcome::Table(grouped) = outcome else {
            panic!("应该返回表格");
        };
        assert_eq!(grouped.financials.len(), 2);
        assert_eq!(grouped.balance_sheet["Total Liabilities"], "9,000");
        assert_eq!(grouped.cash_flow["Net Cash Flow"], "120");
        assert_eq!(
            engine.visited.lock().unwrap().as_slice(),
            ["https://www.screener.in/company/TCS/consolidated/"]
        );
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_financials_extraction_error() {
        let engine = Arc::new(FakeEngine::new(
            FakePage::default().with_element(TABLE_SELECTOR, ""),
        ));

        let outcome = service(&engine).financials("TCS").await.unwrap();
        assert!(matches!(
            outcome,
            FinancialsOutcome::Failed { ref error } if error.contains("stale")
        ));
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_financials_missing_table_is_empty() {
        let engine = Arc::new(FakeEngine::new(FakePage::default()));

        let outcome = service(&engine).financials("TCS").await.unwrap();
        assert_eq!(outcome, FinancialsOutcome::Table(Default::default()));
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_session_failure_is_error() {
        let engine = Arc::new(FakeEngine::new(FakePage {
            fail_session: true,
            ..Default::default()
        }));

        assert!(matches!(service(&engine).financials("TCS").await, Err(ServiceError::Browser(_))));
        assert!(matches!(service(&engine).about("TCS").await, Err(ServiceError::Browser(_))));
        assert_eq!(engine.closed(), 0);
    }
}
