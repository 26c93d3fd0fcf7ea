//! Search Adapter - 网络搜索客户端实现

mod fake_search_client;
mod serper_client;

pub use fake_search_client::FakeWebSearch;
pub use serper_client::{SerperClient, SerperClientConfig};
