//! playSMS generic gateway callback: GET callback.php?id=..&authcode=..&from=..&message=..&to=..&smsc=..

use crate::config::PlaySmsConfig;
use crate::modem::Message;
use crate::platform::{MessageSink, PlatformError};
use async_trait::async_trait;
use std::time::Duration;

/// Pushes received SMS into playSMS.
#[derive(Clone)]
pub struct PlaySmsClient {
    callback_url: String,
    authcode: String,
    to: String,
    smsc: String,
    client: reqwest::Client,
}

impl PlaySmsClient {
    pub fn new(
        config: &PlaySmsConfig,
        callback_url: String,
        authcode: Option<String>,
    ) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            callback_url,
            authcode: authcode.unwrap_or_default(),
            to: config.to.clone(),
            smsc: config.smsc.clone(),
            client,
        })
    }

    fn query<'a>(&'a self, message: &'a Message, id: &'a str) -> [(&'static str, &'a str); 6] {
        [
            ("id", id),
            ("authcode", self.authcode.as_str()),
            ("from", message.phone.as_str()),
            ("message", message.content.as_str()),
            ("to", self.to.as_str()),
            ("smsc", self.smsc.as_str()),
        ]
    }
}

#[async_trait]
impl MessageSink for PlaySmsClient {
    async fn deliver(&self, message: &Message) -> Result<(), PlatformError> {
        let id = message.index.to_string();
        let res = self
            .client
            .get(&self.callback_url)
            .query(&self.query(message, &id))
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(PlatformError::Api(format!("{} {}", status, body)));
        }
        let body = res.text().await.unwrap_or_default();
        log::debug!("playsms callback for SMS {} answered: {}", id, body.trim());
        Ok(())
    }
}
