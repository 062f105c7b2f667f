//! 周期解析
//!
//! 把粗粒度的周期标记映射为上游使用的 (range, interval)

/// 未指定周期时的默认值
pub const DEFAULT_PERIOD: &str = "3mo";
/// 未识别周期时的默认采样间隔
pub const DEFAULT_INTERVAL: &str = "1d";

/// 分钟线/小时线，时间戳需要保留到分钟
const INTRADAY_INTERVALS: [&str; 3] = ["5m", "15m", "1h"];

/// 解析后的请求参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub range: String,
    pub interval: String,
}

impl ResolvedPeriod {
    fn new(range: &str, interval: &str) -> Self {
        Self {
            range: range.to_string(),
            interval: interval.to_string(),
        }
    }
}

/// 解析周期
///
/// 已知标记使用固定组合；其他值原样作为 range，间隔取调用方传入值或 `1d`
pub fn resolve_period(period: &str, interval: Option<&str>) -> ResolvedPeriod {
    match period {
        "1d" => ResolvedPeriod::new("1d", "5m"),
        "1w" => ResolvedPeriod::new("1w", "1h"),
        "1mo" => ResolvedPeriod::new("1mo", "1d"),
        "3mo" => ResolvedPeriod::new("3mo", "1d"),
        "6mo" => ResolvedPeriod::new("6mo", "1d"),
        "1y" => ResolvedPeriod::new("1y", "1d"),
        "max" => ResolvedPeriod::new("max", "1wk"),
        other => ResolvedPeriod::new(other, interval.unwrap_or(DEFAULT_INTERVAL)),
    }
}

/// 采样间隔是否为日内级别
pub fn is_intraday(interval: &str) -> bool {
    INTRADAY_INTERVALS.contains(&interval)
}
