//! HTTP Handlers

mod health;
mod podcast;

pub use health::*;
pub use podcast::*;
