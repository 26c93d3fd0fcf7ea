//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现，以及服务端与命令行共用的装配逻辑

pub mod adapters;
pub mod bootstrap;
pub mod http;
pub mod persistence;

pub use bootstrap::{build_podcast_handler, init_tracing, BootstrapError};
pub use persistence::SledSynthesisCache;
