//! LLM Adapter - 文本生成客户端实现

mod fake_llm_client;
mod openai_client;

pub use fake_llm_client::FakeLanguageModel;
pub use openai_client::{OpenAiClient, OpenAiClientConfig};
