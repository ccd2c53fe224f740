//! Hilink modem protocol: session bootstrap, XML bodies, and the HTTP client.
//!
//! `ModemApi` is the seam the driver worker talks through; `HilinkClient` is the real
//! implementation, tests substitute scripted fakes.

mod client;
mod error;
mod message;
mod session;
pub mod xml;

use async_trait::async_trait;

pub use client::HilinkClient;
pub use error::ModemError;
pub use message::{decode_utf8_dropping_invalid, BoxType, Message, MessageIndex, PLAIN_SMS_TYPE};
pub use session::{Session, SessionManager};

/// Operations the driver worker performs against the modem.
#[async_trait]
pub trait ModemApi: Send + Sync {
    /// Touch the modem once before serving work (e.g. load the web UI to get a cookie). Default does nothing.
    async fn prime(&self) {}

    /// One page of a box, newest first, plain SMS only.
    async fn list_messages(
        &self,
        box_type: BoxType,
        page: u32,
        count: u32,
    ) -> Result<Vec<Message>, ModemError>;

    /// Best effort: failures are logged by the implementation, never returned.
    async fn delete_message(&self, index: MessageIndex);

    /// Hand a message to the modem. Returns once the modem acknowledged it; no index is known yet.
    async fn send_message(&self, numbers: &[String], text: &str) -> Result<(), ModemError>;
}

#[async_trait]
impl<T: ModemApi + ?Sized> ModemApi for std::sync::Arc<T> {
    async fn prime(&self) {
        (**self).prime().await
    }

    async fn list_messages(
        &self,
        box_type: BoxType,
        page: u32,
        count: u32,
    ) -> Result<Vec<Message>, ModemError> {
        (**self).list_messages(box_type, page, count).await
    }

    async fn delete_message(&self, index: MessageIndex) {
        (**self).delete_message(index).await
    }

    async fn send_message(&self, numbers: &[String], text: &str) -> Result<(), ModemError> {
        (**self).send_message(numbers, text).await
    }
}
