//! Hilink web API client (http://192.168.8.1 by default).
//! Lists, sends and deletes SMS; each call fetches its own session first.

use crate::config::ModemConfig;
use crate::modem::error::ModemError;
use crate::modem::message::{decode_utf8_dropping_invalid, BoxType, Message, MessageIndex};
use crate::modem::session::{Session, SessionManager};
use crate::modem::xml;
use crate::modem::ModemApi;
use async_trait::async_trait;
use std::fmt::Write;
use std::time::Duration;

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
const TOKEN_HEADER: &str = "__RequestVerificationToken";

/// Client for the modem's HTTP/XML API. Owned by the driver worker; not meant to be shared.
pub struct HilinkClient {
    base_url: String,
    cookie_path: String,
    date_format: String,
    client: reqwest::Client,
    sessions: SessionManager,
}

impl HilinkClient {
    pub fn new(config: &ModemConfig) -> Result<Self, ModemError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            sessions: SessionManager::new(base_url.clone(), client.clone()),
            base_url,
            cookie_path: config.cookie_path.clone(),
            date_format: config.date_format.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST an XML body with a fresh session and return the response text.
    /// The body is always read as UTF-8 whatever charset the modem claims.
    async fn post_xml(&self, path: &str, body: String) -> Result<String, ModemError> {
        let Session { cookie, token } = self.sessions.get_session().await?;
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .post(&url)
            .header(reqwest::header::COOKIE, cookie)
            .header(TOKEN_HEADER, token)
            .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(ModemError::Api {
                code: res.status().to_string(),
            });
        }
        let body = res.bytes().await?;
        Ok(decode_utf8_dropping_invalid(&body))
    }

    /// Local time in the configured Date format; a bad format string falls back to the modem's own.
    fn now(&self) -> String {
        let now = chrono::Local::now();
        let mut out = String::new();
        if write!(out, "{}", now.format(&self.date_format)).is_err() {
            log::warn!("invalid date format {:?}, using default", self.date_format);
            out = now.format(DEFAULT_DATE_FORMAT).to_string();
        }
        out
    }
}

#[async_trait]
impl ModemApi for HilinkClient {
    async fn prime(&self) {
        let url = format!("{}{}", self.base_url, self.cookie_path);
        match self.client.get(&url).send().await {
            Ok(res) => log::debug!("modem landing page {} -> {}", url, res.status()),
            Err(e) => log::warn!("modem not reachable at {}: {}", url, e),
        }
    }

    async fn list_messages(
        &self,
        box_type: BoxType,
        page: u32,
        count: u32,
    ) -> Result<Vec<Message>, ModemError> {
        let body = xml::sms_list_request(box_type, page, count);
        let text = self.post_xml("/api/sms/sms-list", body).await?;
        xml::parse_message_list(&text, box_type)
    }

    async fn delete_message(&self, index: MessageIndex) {
        log::info!("deleting SMS with index {}", index);
        let result = match self
            .post_xml("/api/sms/delete-sms", xml::delete_sms_request(index))
            .await
        {
            Ok(text) => xml::check_envelope(&text),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            log::warn!("delete of SMS {} failed: {}", index, e);
        }
    }

    async fn send_message(&self, numbers: &[String], text: &str) -> Result<(), ModemError> {
        log::info!("sending SMS to {}: {}", numbers.join(","), text);
        let body = xml::send_sms_request(numbers, text, &self.now());
        let res = self.post_xml("/api/sms/send-sms", body).await?;
        xml::check_envelope(&res)
    }
}
