//! Web Search Port - 网络搜索能力抽象

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 搜索错误
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API key missing: set {0}")]
    ApiKeyMissing(&'static str),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 一条搜索结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Web Search Port
#[async_trait]
pub trait WebSearchPort: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

/// 将搜索结果格式化为提示上下文
pub fn format_search_hits(query: &str, hits: &[SearchHit]) -> String {
    let mut out = format!("Search results for \"{}\":", query);
    if hits.is_empty() {
        out.push_str("\n(no results)");
    }
    for hit in hits {
        out.push_str(&format!(
            "\n---\nTitle: {}\nLink: {}\nSnippet: {}",
            hit.title, hit.link, hit.snippet
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_search_hits() {
        let hits = vec![SearchHit {
            title: "Apple stock".to_string(),
            link: "https://example.com/aapl".to_string(),
            snippet: "AAPL closed at $245.55".to_string(),
        }];
        let text = format_search_hits("Apple stock price", &hits);
        assert!(text.starts_with("Search results for \"Apple stock price\":"));
        assert!(text.contains("Snippet: AAPL closed at $245.55"));
    }

    #[test]
    fn test_format_empty_hits() {
        assert!(format_search_hits("x", &[]).ends_with("(no results)"));
    }
}
