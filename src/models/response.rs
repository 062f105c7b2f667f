//! 通用响应模型
//!
//! 错误响应体与健康检查响应

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// 错误响应体
///
/// - 上游失败: `{"error": ..., "message": ...}`
/// - 未找到: `{"message": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// 原始错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 面向调用方的说明
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: None,
            message: message.into(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// 健康检查响应
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// 服务名称（market / scraper）
    pub service: String,
    /// 响应时间戳（RFC 3339）
    pub timestamp: String,
}

impl HealthStatus {
    pub fn ok(service: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
