//! 财务表格抓取与行分类

use std::time::Duration;

use crate::error::ServiceError;
use crate::models::{FinancialsOutcome, ScrapedFinancials};
use crate::services::browser::BrowserSession;

/// 财务表格
pub const TABLE_SELECTOR: &str = "table.data-table";
/// 表格中的数据行
pub const ROW_SELECTOR: &str = "table.data-table tbody tr";
const CELL_SELECTOR: &str = "td";

const FINANCIALS_KEYWORDS: [&str; 4] = ["Sales", "Net Profit", "EPS", "ROCE"];
const BALANCE_SHEET_KEYWORDS: [&str; 3] = ["Reserves", "Liabilities", "Assets"];
const CASH_FLOW_KEYWORDS: [&str; 2] = ["Cash from", "Net Cash Flow"];

/// 财务数据分组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinancialSection {
    Financials,
    BalanceSheet,
    CashFlow,
}

/// 按标签关键字分类（区分大小写，先匹配先得）
///
/// 都不匹配的行归入 Financials
pub fn classify_row(label: &str) -> FinancialSection {
    if contains_any(label, &FINANCIALS_KEYWORDS) {
        FinancialSection::Financials
    } else if contains_any(label, &BALANCE_SHEET_KEYWORDS) {
        FinancialSection::BalanceSheet
    } else if contains_any(label, &CASH_FLOW_KEYWORDS) {
        FinancialSection::CashFlow
    } else {
        FinancialSection::Financials
    }
}

fn contains_any(label: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| label.contains(k))
}

/// 把表格行归入三个分组
///
/// 首列为标签、末列为数值；少于两列的行忽略，重复标签保留最后一次的值
pub fn group_rows(rows: Vec<Vec<String>>) -> ScrapedFinancials {
    let mut grouped = ScrapedFinancials::default();

    for row in rows {
        if row.len() < 2 {
            continue;
        }
        let label = row[0].trim().to_string();
        let value = row[row.len() - 1].trim().to_string();

        let bucket = match classify_row(&label) {
            FinancialSection::Financials => &mut grouped.financials,
            FinancialSection::BalanceSheet => &mut grouped.balance_sheet,
            FinancialSection::CashFlow => &mut grouped.cash_flow,
        };
        bucket.insert(label, value);
    }

    grouped
}

/// 在会话中抓取财务表格
///
/// 打开页面后随机等待，再读取表格；表格未出现时返回空分组，其他失败写入 error
pub async fn scrape_financials(
    session: &mut dyn BrowserSession,
    url: &str,
    delay: Duration,
    timeout: Duration,
) -> FinancialsOutcome {
    match read_table(session, url, delay, timeout).await {
        Ok(grouped) => FinancialsOutcome::Table(grouped),
        Err(e) => {
            log::warn!("抓取财务表格失败 {}: {}", url, e);
            FinancialsOutcome::Failed { error: e.to_string() }
        }
    }
}

async fn read_table(
    session: &mut dyn BrowserSession,
    url: &str,
    delay: Duration,
    timeout: Duration,
) -> Result<ScrapedFinancials, ServiceError> {
    session.navigate(url).await?;

    if !delay.is_zero() {
        log::debug!("随机等待 {} ms", delay.as_millis());
        tokio::time::sleep(delay).await;
    }

    match session.wait_for_element(TABLE_SELECTOR, timeout).await {
        Ok(()) => {}
        Err(e @ ServiceError::ElementTimeout { .. }) => {
            log::warn!("{}: {}", url, e);
            return Ok(ScrapedFinancials::default());
        }
        Err(e) => return Err(e),
    }

    let rows = session.extract_table_rows(ROW_SELECTOR, CELL_SELECTOR).await?;
    Ok(group_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    /// 测试行分类
    #[test]
    fn test_classify_row() {
        let test_cases = vec![
            ("Net Profit Margin", FinancialSection::Financials),
            ("Sales +", FinancialSection::Financials),
            ("EPS in Rs", FinancialSection::Financials),
            ("ROCE %", FinancialSection::Financials),
            ("Total Liabilities", FinancialSection::BalanceSheet),
            ("Reserves", FinancialSection::BalanceSheet),
            ("Other Assets +", FinancialSection::BalanceSheet),
            ("Net Cash Flow from Operations", FinancialSection::CashFlow),
            ("Cash from Investing Activity +", FinancialSection::CashFlow),
        ];

        for (label, expected) in &test_cases {
            let section = classify_row(label);
            println!("  {} -> {:?}", label, section);
            assert_eq!(section, *expected, "label={}", label);
        }
    }

    /// 未匹配任何关键字的行目前归入 Financials，而不是单独的 other 分组
    #[test]
    fn test_unmatched_label_falls_back_to_financials() {
        assert_eq!(classify_row("Face Value"), FinancialSection::Financials);
        assert_eq!(classify_row("Dividend Payout %"), FinancialSection::Financials);
    }

    #[test]
    fn test_first_match_wins() {
        // 同时包含 Net Profit 与 Assets，按顺序归入 Financials
        assert_eq!(classify_row("Net Profit on Assets"), FinancialSection::Financials);
        // 同时包含 Liabilities 与 Cash from
        assert_eq!(
            classify_row("Cash from Liabilities"),
            FinancialSection::BalanceSheet
        );
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(classify_row("total liabilities"), FinancialSection::Financials);
    }

    #[test]
    fn test_group_rows() {
        let rows = vec![
            row(&["Sales +", "1,000", "1,200"]),
            row(&[" Total Liabilities ", "5,000", " 5,500 "]),
            row(&["Net Cash Flow", "-20", "35"]),
            row(&["Face Value", "10"]),
            row(&["Raw PDF"]),
            row(&[]),
            row(&["Sales +", "x", "1,300"]),
        ];

        let grouped = group_rows(rows);
        assert_eq!(grouped.financials.get("Sales +").map(String::as_str), Some("1,300"));
        assert_eq!(grouped.financials.get("Face Value").map(String::as_str), Some("10"));
        assert_eq!(
            grouped.balance_sheet.get("Total Liabilities").map(String::as_str),
            Some("5,500")
        );
        assert_eq!(grouped.cash_flow.get("Net Cash Flow").map(String::as_str), Some("35"));
        assert_eq!(grouped.financials.len(), 2);
        assert!(!grouped.financials.contains_key("Raw PDF"));
    }
}
