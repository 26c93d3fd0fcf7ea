//! Fake Search Client - 用于测试和离线运行的搜索客户端

use async_trait::async_trait;
use std::sync::Mutex;

use crate::application::ports::{SearchError, SearchHit, WebSearchPort};

/// Fake Web Search
///
/// 为每个查询返回一条固定结果，并记录查询
pub struct FakeWebSearch {
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl FakeWebSearch {
    pub fn new() -> Self {
        Self {
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// 每次搜索都失败
    pub fn failing() -> Self {
        Self {
            fail: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl Default for FakeWebSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearchPort for FakeWebSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }

        if self.fail {
            return Err(SearchError::ServiceError("search unavailable".to_string()));
        }

        Ok(vec![SearchHit {
            title: format!("Result for {}", query),
            link: "https://example.com/result".to_string(),
            snippet: format!("Latest coverage of {}", query),
        }])
    }
}
