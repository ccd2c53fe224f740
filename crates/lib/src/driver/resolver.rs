//! Recovering the index of a message we just sent.
//!
//! send-sms answers with a bare OK and the message only shows up in the outbox a little
//! later. Since the worker is the only thing touching the modem, clearing the outbox before
//! the send means whatever sits there afterwards is ours.

use crate::driver::DriverSettings;
use crate::modem::{BoxType, MessageIndex, ModemApi, ModemError};

/// Clear the outbox, send, wait out the settle window, then pick up and delete our entry.
/// `Ok(None)` means the send was accepted but its index could not be found.
pub(crate) async fn send_and_resolve(
    api: &dyn ModemApi,
    settings: &DriverSettings,
    numbers: &[String],
    text: &str,
) -> Result<Option<MessageIndex>, ModemError> {
    drain_outbox(api, settings).await?;
    api.send_message(numbers, text).await?;

    let attempts = settings.attempts.max(1);
    let mut listing = Vec::new();
    for attempt in 1..=attempts {
        tokio::time::sleep(settings.interval).await;
        listing = match api
            .list_messages(BoxType::Outbound, 1, settings.page_size)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                log::warn!("outbox poll {}/{} failed: {}", attempt, attempts, e);
                Vec::new()
            }
        };
    }

    let Some(first) = listing.first() else {
        log::error!(
            "sent SMS was not stored in outbox after {} polls",
            attempts
        );
        return Ok(None);
    };
    let index = first.index;
    if listing.len() > 1 {
        log::warn!(
            "after SMS sent, {} messages in outbox; using index {}",
            listing.len(),
            index
        );
    }
    api.delete_message(index).await;
    Ok(Some(index))
}

/// Delete everything left in the outbox by earlier sends, until a listing comes back empty.
async fn drain_outbox(api: &dyn ModemApi, settings: &DriverSettings) -> Result<(), ModemError> {
    let passes = settings.drain_limit.max(1);
    for _ in 0..passes {
        let stale = api
            .list_messages(BoxType::Outbound, 1, settings.page_size)
            .await?;
        if stale.is_empty() {
            return Ok(());
        }
        log::info!("removing {} lingering SMS from outbox", stale.len());
        for message in &stale {
            api.delete_message(message.index).await;
        }
    }
    Err(ModemError::protocol(format!(
        "outbox still not empty after {} passes",
        passes
    )))
}
