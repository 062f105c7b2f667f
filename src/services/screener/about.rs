//! 公司简介抓取

use std::time::Duration;

use crate::error::ServiceError;
use crate::models::{ScrapedAbout, NOT_APPLICABLE, NOT_AVAILABLE};
use crate::services::browser::BrowserSession;

/// 公司名称
pub const NAME_SELECTOR: &str = "h1.margin-0.show-from-tablet-landscape";
/// 公司简介段落
pub const ABOUT_SELECTOR: &str = "div.about p";

/// 在会话中抓取公司名称与简介
///
/// 名称未出现时把错误写入结果，不向上抛出
pub async fn scrape_about(
    session: &mut dyn BrowserSession,
    url: &str,
    timeout: Duration,
) -> ScrapedAbout {
    match read_about(session, url, timeout).await {
        Ok((company_name, about)) => ScrapedAbout {
            company_name,
            about,
            error: None,
        },
        Err(e) => {
            log::warn!("抓取公司简介失败 {}: {}", url, e);
            ScrapedAbout {
                error: Some(e.to_string()),
                ..ScrapedAbout::default()
            }
        }
    }
}

async fn read_about(
    session: &mut dyn BrowserSession,
    url: &str,
    timeout: Duration,
) -> Result<(String, String), ServiceError> {
    session.navigate(url).await?;

    session.wait_for_element(NAME_SELECTOR, timeout).await?;
    let name = session
        .extract_text(NAME_SELECTOR)
        .await?
        .unwrap_or_else(|| NOT_APPLICABLE.to_string());

    // 简介缺失不影响名称
    let about = match read_description(session, timeout).await {
        Ok(Some(text)) => text,
        Ok(None) => NOT_AVAILABLE.to_string(),
        Err(e) => {
            log::warn!("{}: {}", url, e);
            NOT_AVAILABLE.to_string()
        }
    };

    Ok((name, about))
}

async fn read_description(
    session: &mut dyn BrowserSession,
    timeout: Duration,
) -> Result<Option<String>, ServiceError> {
    session.wait_for_element(ABOUT_SELECTOR, timeout).await?;
    session.extract_text(ABOUT_SELECTOR).await
}
