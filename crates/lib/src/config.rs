//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.hilink/config.json`) and environment.
//! Every section has defaults, so an empty `{}` (or no file at all) talks to a modem
//! at the factory address and serves the gateway on loopback.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Modem web API settings.
    #[serde(default)]
    pub modem: ModemConfig,

    /// Tuning for recovering the index of a sent message.
    #[serde(default)]
    pub send_resolution: SendResolutionConfig,

    /// Inbox polling settings.
    #[serde(default)]
    pub poller: PollerConfig,

    /// playSMS callback settings (where received SMS are pushed).
    #[serde(default)]
    pub playsms: PlaySmsConfig,

    /// HTTP gateway (receives send requests from playSMS).
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Modem base URL and request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModemConfig {
    /// Base URL of the hilink web UI (default "http://192.168.8.1").
    #[serde(default = "default_modem_base_url")]
    pub base_url: String,

    /// Page fetched once when the worker starts (default "/html/index.html").
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,

    /// ReadCount sent with sms-list (default 10).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Transport timeout per HTTP request in seconds (default 10).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// chrono format for the send-sms Date field.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_modem_base_url() -> String {
    "http://192.168.8.1".to_string()
}

fn default_cookie_path() -> String {
    "/html/index.html".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            base_url: default_modem_base_url(),
            cookie_path: default_cookie_path(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            date_format: default_date_format(),
        }
    }
}

/// After a send the modem needs a moment before the message shows up in the outbox.
/// The defaults (5 polls, one second apart) were tuned on an E3372; other models may need more.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResolutionConfig {
    /// Number of outbox listings after the send (default 5, 0 is treated as 1). Only the last one is inspected.
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Sleep before each listing, in milliseconds (default 1000).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Upper bound on list/delete passes when clearing the outbox before a send (default 16).
    #[serde(default = "default_drain_limit")]
    pub drain_limit: u32,
}

fn default_attempts() -> u32 {
    5
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_drain_limit() -> u32 {
    16
}

impl Default for SendResolutionConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            interval_ms: default_interval_ms(),
            drain_limit: default_drain_limit(),
        }
    }
}

impl SendResolutionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Inbox polling period and delete policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollerConfig {
    /// Seconds between inbox polls (default 10).
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,

    /// Delete a received message even when forwarding it to playSMS failed (default true).
    /// Setting this to false keeps the message on the modem and retries it next cycle.
    #[serde(default = "default_true")]
    pub delete_on_forward_failure: bool,
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            delete_on_forward_failure: true,
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// playSMS generic gateway callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySmsConfig {
    /// e.g. "http://playsms.local/playsms/plugin/gateway/generic/callback.php". When unset the inbox poller is not started.
    pub callback_url: Option<String>,

    /// Shared secret configured in the generic gateway plugin. Overridden by PLAYSMS_AUTHCODE env.
    pub authcode: Option<String>,

    /// Number reported as the receiving party ("to").
    #[serde(default)]
    pub to: String,

    /// smsc name reported to playSMS (default "generic").
    #[serde(default = "default_smsc")]
    pub smsc: String,

    /// Transport timeout for the callback in seconds (default 10).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_smsc() -> String {
    "generic".to_string()
}

impl Default for PlaySmsConfig {
    fn default() -> Self {
        Self {
            callback_url: None,
            authcode: None,
            to: String::new(),
            smsc: default_smsc(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 8888).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8888
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Resolve the playSMS authcode: env PLAYSMS_AUTHCODE overrides config.
pub fn resolve_playsms_authcode(config: &Config) -> Option<String> {
    std::env::var("PLAYSMS_AUTHCODE")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .playsms
                .authcode
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("HILINK_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".hilink").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, or the default path (or HILINK_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
