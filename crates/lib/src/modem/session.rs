//! Session bootstrap: every modem call needs a fresh cookie + anti-CSRF token.

use crate::modem::error::ModemError;
use crate::modem::xml;

/// Cookie (SesInfo) and request verification token (TokInfo). Single-use; never cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub cookie: String,
    pub token: String,
}

/// Fetches a new session from GET /api/webserver/SesTokInfo.
#[derive(Clone)]
pub struct SessionManager {
    base_url: String,
    client: reqwest::Client,
}

impl SessionManager {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// One GET, no caching: called again before the next protocol request.
    pub async fn get_session(&self) -> Result<Session, ModemError> {
        let url = format!("{}/api/webserver/SesTokInfo", self.base_url);
        let res = self.client.get(&url).send().await?;
        if !res.status().is_success() {
            return Err(ModemError::Api {
                code: res.status().to_string(),
            });
        }
        let body = res.text().await?;
        xml::parse_session(&body)
    }
}
