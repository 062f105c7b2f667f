//! 浏览器自动化抽象
//!
//! 抓取逻辑只依赖 `BrowserEngine` / `BrowserSession`，
//! 生产环境通过 WebDriver 驱动 Chrome，测试中使用内存实现。

pub mod webdriver;

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::ServiceError;

pub use webdriver::WebDriverEngine;

/// 浏览器引擎，每次调用创建一个独立会话
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn new_session(&self) -> Result<Box<dyn BrowserSession>, ServiceError>;
}

/// 浏览器会话
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), ServiceError>;

    /// 等待元素出现，超时返回 `ServiceError::ElementTimeout`
    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), ServiceError>;

    /// 第一个匹配元素的文本（已去除首尾空白），不存在时为 `None`
    async fn extract_text(&mut self, selector: &str) -> Result<Option<String>, ServiceError>;

    /// 按行选择器取出每一行的单元格文本
    async fn extract_table_rows(
        &mut self,
        row_selector: &str,
        cell_selector: &str,
    ) -> Result<Vec<Vec<String>>, ServiceError>;

    async fn close(self: Box<Self>) -> Result<(), ServiceError>;
}

/// 持有会话直到显式关闭
///
/// 请求被取消（客户端断开、停机超时）时，`Drop` 把会话交给后台任务关闭
struct SessionGuard(Option<Box<dyn BrowserSession>>);

impl SessionGuard {
    async fn close(mut self) {
        if let Some(session) = self.0.take() {
            if let Err(e) = session.close().await {
                log::warn!("关闭浏览器会话失败: {}", e);
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.0.take() else {
            return;
        };
        log::warn!("请求已取消，后台关闭浏览器会话");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        log::warn!("关闭浏览器会话失败: {}", e);
                    }
                });
            }
            Err(_) => log::error!("没有可用的运行时，浏览器会话未关闭"),
        }
    }
}

/// 在会话上执行抓取，无论成功、出错、panic 还是请求被取消都会关闭会话
///
/// ```ignore
/// let out = with_session(engine, |s| Box::pin(scrape(s))).await?;
/// ```
pub async fn with_session<T, F>(engine: &dyn BrowserEngine, job: F) -> Result<T, ServiceError>
where
    F: for<'s> FnOnce(&'s mut dyn BrowserSession) -> futures::future::BoxFuture<'s, T>,
{
    let mut guard = SessionGuard(Some(engine.new_session().await?));
    let outcome = match guard.0.as_deref_mut() {
        Some(session) => AssertUnwindSafe(job(session)).catch_unwind().await,
        None => return Err(ServiceError::browser("浏览器会话已释放")),
    };

    guard.close().await;

    match outcome {
        Ok(value) => Ok(value),
        Err(payload) => panic::resume_unwind(payload),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! 内存浏览器，记录会话打开/关闭次数

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// 页面脚本：决定各操作的返回结果
    #[derive(Clone, Default)]
    pub struct FakePage {
        pub fail_session: bool,
        pub fail_navigate: bool,
        /// 选择器 → 元素文本
        pub elements: HashMap<String, String>,
        /// `None` 表示读取表格时驱动报错
        pub rows: Option<Vec<Vec<String>>>,
        pub panic_on_rows: bool,
    }

    impl FakePage {
        pub fn with_element(mut self, selector: &str, text: &str) -> Self {
            self.elements.insert(selector.to_string(), text.to_string());
            self
        }
    }

    #[derive(Default)]
    pub struct FakeEngine {
        pub page: FakePage,
        pub opened: Arc<AtomicUsize>,
        pub closed: Arc<AtomicUsize>,
        pub visited: Arc<Mutex<Vec<String>>>,
    }

    impl FakeEngine {
        pub fn new(page: FakePage) -> Self {
            Self {
                page,
                ..Default::default()
            }
        }

        pub fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        pub fn closed(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }
    }

    struct FakeSession {
        page: FakePage,
        closed: Arc<AtomicUsize>,
        visited: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl BrowserEngine for FakeEngine {
        async fn new_session(&self) -> Result<Box<dyn BrowserSession>, ServiceError> {
            if self.page.fail_session {
                return Err(ServiceError::browser("session not created"));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                page: self.page.clone(),
                closed: self.closed.clone(),
                visited: self.visited.clone(),
            }))
        }
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        async fn navigate(&mut self, url: &str) -> Result<(), ServiceError> {
            if self.page.fail_navigate {
                return Err(ServiceError::browser("net::ERR_NAME_NOT_RESOLVED"));
            }
            self.visited.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), ServiceError> {
            if self.page.elements.contains_key(selector) {
                Ok(())
            } else {
                Err(ServiceError::ElementTimeout {
                    selector: selector.to_string(),
                    timeout_secs: timeout.as_secs(),
                })
            }
        }

        async fn extract_text(&mut self, selector: &str) -> Result<Option<String>, ServiceError> {
            Ok(self.page.elements.get(selector).map(|t| t.trim().to_string()))
        }

        async fn extract_table_rows(
            &mut self,
            _row_selector: &str,
            _cell_selector: &str,
        ) -> Result<Vec<Vec<String>>, ServiceError> {
            if self.page.panic_on_rows {
                panic!("driver crashed");
            }
            self.page
                .rows
                .clone()
                .ok_or_else(|| ServiceError::browser("stale element reference"))
        }

        async fn close(self: Box<Self>) -> Result<(), ServiceError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeEngine, FakePage};
    use super::*;

    #[actix_web::test]
    async fn test_session_closed_on_success() {
        let engine = FakeEngine::new(FakePage::default().with_element("h1", " Title "));

        let text = with_session(&engine, |s| {
            Box::pin(async move { s.extract_text("h1").await })
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(text.as_deref(), Some("Title"));
        assert_eq!(engine.opened(), 1);
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_session_closed_on_error() {
        let engine = FakeEngine::new(FakePage::default());

        let result = with_session(&engine, |s| {
            Box::pin(async move { s.wait_for_element("h1", Duration::from_secs(1)).await })
        })
        .await
        .unwrap();

        assert!(matches!(result, Err(ServiceError::ElementTimeout { .. })));
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_session_closed_on_panic() {
        let engine = FakeEngine::new(FakePage {
            panic_on_rows: true,
            ..Default::default()
        });

        let caught = AssertUnwindSafe(with_session(&engine, |s| {
            Box::pin(async move { s.extract_table_rows("tr", "td").await })
        }))
        .catch_unwind()
        .await;

        assert!(caught.is_err());
        assert_eq!(engine.opened(), 1);
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_session_closed_when_request_dropped() {
        let engine = FakeEngine::new(FakePage::default());

        let mut pending = Box::pin(with_session(&engine, |_s| {
            Box::pin(futures::future::pending::<()>())
        }));
        assert!(futures::poll!(pending.as_mut()).is_pending());
        assert_eq!(engine.opened(), 1);
        assert_eq!(engine.closed(), 0);

        drop(pending);
        for _ in 0..100 {
            if engine.closed() == engine.opened() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(engine.closed(), 1);
    }

    #[actix_web::test]
    async fn test_no_close_without_session() {
        let engine = FakeEngine::new(FakePage {
            fail_session: true,
            ..Default::default()
        });

        let result = with_session(&engine, |_| Box::pin(async {})).await;
        assert!(matches!(result, Err(ServiceError::Browser(_))));
        assert_eq!(engine.opened(), 0);
        assert_eq!(engine.closed(), 0);
    }
}
