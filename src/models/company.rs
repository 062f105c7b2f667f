//! 网页抓取结果模型

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 字段缺失时的初始值
pub const NOT_APPLICABLE: &str = "N/A";
/// 公司简介元素不存在时的占位
pub const NOT_AVAILABLE: &str = "Not available";

/// 公司简介
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedAbout {
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "About")]
    pub about: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for ScrapedAbout {
    fn default() -> Self {
        Self {
            company_name: NOT_APPLICABLE.to_string(),
            about: NOT_APPLICABLE.to_string(),
            error: None,
        }
    }
}

/// 财务表格分组
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedFinancials {
    #[serde(rename = "Financials")]
    pub financials: BTreeMap<String, String>,
    #[serde(rename = "Balance Sheet")]
    pub balance_sheet: BTreeMap<String, String>,
    #[serde(rename = "Cash Flow")]
    pub cash_flow: BTreeMap<String, String>,
}

/// 财务抓取结果：成功时为分组表格，失败时只有 error 字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FinancialsOutcome {
    Table(ScrapedFinancials),
    Failed { error: String },
}
