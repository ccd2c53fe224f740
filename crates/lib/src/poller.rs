//! Inbox poller: every few seconds, forward received SMS to the platform and remove them
//! from the modem.
//!
//! All modem access goes through the driver queue, so a poll never races an in-flight send.
//! By default a message is deleted even when forwarding failed (a platform outage loses
//! those messages); `poller.deleteOnForwardFailure = false` keeps them for the next cycle.

use crate::config::PollerConfig;
use crate::driver::ModemDriver;
use crate::modem::ModemError;
use crate::platform::MessageSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Outcome of one poll cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub forwarded: usize,
    pub failed: usize,
    pub deleted: usize,
}

pub struct InboxPoller {
    driver: ModemDriver,
    sink: Arc<dyn MessageSink>,
    interval: Duration,
    delete_on_forward_failure: bool,
}

impl InboxPoller {
    pub fn new(driver: ModemDriver, sink: Arc<dyn MessageSink>, config: &PollerConfig) -> Self {
        Self {
            driver,
            sink,
            interval: config.interval(),
            delete_on_forward_failure: config.delete_on_forward_failure,
        }
    }

    /// One cycle: list the inbox, then forward and delete each message in turn.
    pub async fn poll_once(&self) -> Result<PollSummary, ModemError> {
        let messages = self.driver.list_received_sms().await?;
        let mut summary = PollSummary::default();
        for message in &messages {
            log::info!(
                "received SMS index: {}  from: {}  message: {}",
                message.index,
                message.phone,
                message.content
            );
            let delivered = match self.sink.deliver(message).await {
                Ok(()) => {
                    summary.forwarded += 1;
                    true
                }
                Err(e) => {
                    log::error!("forwarding SMS {} failed: {}", message.index, e);
                    summary.failed += 1;
                    false
                }
            };
            if delivered || self.delete_on_forward_failure {
                self.driver.delete_sms(message.index).await?;
                summary.deleted += 1;
            } else {
                log::warn!("keeping SMS {} on the modem for the next poll", message.index);
            }
        }
        Ok(summary)
    }

    /// Poll forever on a fixed period. The task only ends when the driver has stopped.
    pub fn start(self) -> JoinHandle<()> {
        log::info!("inbox poller: polling every {:?}", self.interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.poll_once().await {
                    Ok(s) if s.forwarded + s.failed > 0 => {
                        log::info!(
                            "inbox poll: forwarded {}, failed {}, deleted {}",
                            s.forwarded,
                            s.failed,
                            s.deleted
                        );
                    }
                    Ok(_) => {}
                    Err(ModemError::WorkerStopped) => {
                        log::info!("inbox poller: modem worker stopped, exiting");
                        return;
                    }
                    Err(e) => log::warn!("inbox poll failed: {}", e),
                }
            }
        })
    }
}
