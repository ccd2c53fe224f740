//! Messaging platform side: where received SMS are delivered.
//!
//! `MessageSink` is what the inbox poller forwards to; `PlaySmsClient` pushes into the
//! playSMS generic gateway callback.

mod playsms;

use crate::modem::Message;
use async_trait::async_trait;

pub use playsms::PlaySmsClient;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("platform request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("platform api error: {0}")]
    Api(String),
}

/// Receiver of inbound SMS.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver one received message. Returns once the platform answered.
    async fn deliver(&self, message: &Message) -> Result<(), PlatformError>;
}
