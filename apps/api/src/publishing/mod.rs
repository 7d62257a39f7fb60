//! External posting capability.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod oauth;
pub mod x_client;

pub use x_client::XClient;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("post rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("post is {chars} characters, limit is {limit}")]
    TooLong { chars: usize, limit: usize },

    #[error("post is empty")]
    Empty,

    #[error("request signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    /// Identifier assigned by the platform, when it reports one.
    pub post_id: Option<String>,
}

/// Posts one short text message. No delivery confirmation beyond the result.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<PublishReceipt, PublishError>;
}
