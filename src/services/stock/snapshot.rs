//! 公司快照组装

use crate::models::{Bar, CompanyMetadata, CompanySnapshot};

use super::history::round2;

/// 合并描述信息与当日价格样本
///
/// 没有当日样本时价格类字段为空，描述类字段照常填充
pub fn assemble_snapshot(
    symbol: &str,
    metadata: &CompanyMetadata,
    day: Option<&Bar>,
) -> CompanySnapshot {
    let current_price = day.map(|bar| round2(bar.close));
    let previous_close = round2(metadata.previous_close.unwrap_or(0.0));
    let price_change = current_price.map(|price| round2(price - previous_close));

    CompanySnapshot {
        symbol: symbol.to_uppercase(),
        company_name: metadata.long_name.clone(),
        company_description: metadata.long_business_summary.clone(),
        current_price,
        price_change,
        day_high: day.map(|bar| round2(bar.high)),
        day_low: day.map(|bar| round2(bar.low)),
        previous_close,
        volume: metadata.volume,
        pe_ratio: metadata.trailing_pe,
    }
}
