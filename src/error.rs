//! 服务错误定义
//!
//! 所有处理器在边界处把失败转换为 `ServiceError`，再由 actix 渲染成 JSON 响应

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorBody;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// 上游数据源或目标站点不可用 / 返回结构异常
    #[error("{message}: {detail}")]
    Upstream { message: String, detail: String },

    /// 上游没有该代码的数据
    #[error("{0}")]
    NotFound(String),

    /// 浏览器会话创建或驱动调用失败
    #[error("浏览器操作失败: {0}")]
    Browser(String),

    /// 页面元素在限定时间内未出现，由抓取逻辑就地处理
    #[error("等待元素 {selector} 超时 ({timeout_secs}s)")]
    ElementTimeout { selector: String, timeout_secs: u64 },
}

impl ServiceError {
    pub fn upstream(message: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Upstream {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    pub fn browser(detail: impl std::fmt::Display) -> Self {
        Self::Browser(detail.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Upstream { message, detail } => {
                ErrorBody::new(message.clone()).with_error(detail.clone())
            }
            Self::NotFound(message) => ErrorBody::new(message.clone()),
            Self::Browser(detail) => {
                ErrorBody::new("Browser session unavailable").with_error(detail.clone())
            }
            Self::ElementTimeout { .. } => ErrorBody::new(self.to_string()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
