//! HTTP clients for the Komorebi chat and insight endpoints.

mod edge_client;

pub mod chat_client;
pub mod insight_client;

pub use chat_client::ChatApiClient;
pub use insight_client::InsightApiClient;
