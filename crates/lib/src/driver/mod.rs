//! Serialized access to the modem.
//!
//! `ModemDriver` is a cheap, cloneable handle. Every call becomes a work item on one FIFO
//! queue served by a single worker task, which is the only owner of the modem client.
//! Callers wait on their own reply channel; other callers can keep enqueueing meanwhile.

mod handle;
mod resolver;
mod worker;

use crate::config::Config;
use std::time::Duration;

pub use handle::ModemDriver;

/// Worker tuning, taken from the modem and sendResolution config sections.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// ReadCount for every sms-list call.
    pub page_size: u32,
    /// Outbox polls after a send.
    pub attempts: u32,
    /// Sleep before each of those polls.
    pub interval: Duration,
    /// Max list/delete passes when clearing the outbox before a send.
    pub drain_limit: u32,
}

impl DriverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.modem.page_size,
            attempts: config.send_resolution.attempts,
            interval: config.send_resolution.interval(),
            drain_limit: config.send_resolution.drain_limit,
        }
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
