//! Serper Client - Google 搜索 API 客户端
//!
//! 实现 WebSearchPort trait
//!
//! POST {base_url}/search
//! Header: X-API-KEY
//! Request: {"q": "...", "num": 5}
//! Response: {"organic": [{title, link, snippet}, ...]}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{SearchError, SearchHit, WebSearchPort};

const API_KEY_ENV: &str = "SERPER_API_KEY";

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl From<SerperResult> for SearchHit {
    fn from(r: SerperResult) -> Self {
        Self {
            title: r.title,
            link: r.link,
            snippet: r.snippet,
        }
    }
}

/// Serper 客户端配置
#[derive(Debug, Clone)]
pub struct SerperClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// 每次搜索返回的结果数
    pub results_per_query: usize,
    pub timeout_secs: u64,
}

impl Default for SerperClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://google.serper.dev".to_string(),
            api_key: None,
            results_per_query: 5,
            timeout_secs: 30,
        }
    }
}

/// Serper 搜索客户端
pub struct SerperClient {
    client: Client,
    config: SerperClientConfig,
}

impl SerperClient {
    pub fn new(config: SerperClientConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl WebSearchPort for SerperClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(SearchError::ApiKeyMissing(API_KEY_ENV))?;

        tracing::debug!(url = %self.search_url(), query = %query, "Sending search request");

        let response = self
            .client
            .post(self.search_url())
            .header("X-API-KEY", api_key)
            .json(&SerperRequest {
                q: query,
                num: self.config.results_per_query,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else {
                    SearchError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .organic
            .into_iter()
            .take(self.config.results_per_query)
            .map(SearchHit::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let json = r#"{
            "searchParameters": {"q": "Apple"},
            "organic": [
                {"title": "Apple Inc.", "link": "https://apple.com", "snippet": "AAPL", "position": 1},
                {"title": "No snippet", "link": "https://example.com"}
            ]
        }"#;
        let parsed: SerperResponse = serde_json::from_str(json).unwrap();
        let hits: Vec<SearchHit> = parsed.organic.into_iter().map(SearchHit::from).collect();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Apple Inc.");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_parse_response_without_results() {
        let parsed: SerperResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.organic.is_empty());
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = SerperClient::new(SerperClientConfig::default()).unwrap();
        let err = client.search("Apple").await.unwrap_err();
        assert!(matches!(err, SearchError::ApiKeyMissing("SERPER_API_KEY")));
    }
}
