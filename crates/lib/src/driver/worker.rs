//! The single worker task that owns the modem client.
//!
//! The modem's web session breaks when requests overlap, so every operation is queued here
//! and run to completion before the next one starts.

use crate::driver::resolver::send_and_resolve;
use crate::driver::DriverSettings;
use crate::modem::{BoxType, Message, MessageIndex, ModemApi, ModemError};
use tokio::sync::{mpsc, oneshot};

pub(crate) type Reply<T> = oneshot::Sender<T>;

/// One queued operation with its private reply channel.
pub(crate) enum WorkItem {
    ListInbox {
        reply: Reply<Result<Vec<Message>, ModemError>>,
    },
    ListOutbox {
        reply: Reply<Result<Vec<Message>, ModemError>>,
    },
    Send {
        numbers: Vec<String>,
        text: String,
        reply: Reply<Result<Option<MessageIndex>, ModemError>>,
    },
    Delete {
        index: MessageIndex,
        reply: Reply<()>,
    },
    Stop {
        reply: Reply<()>,
    },
}

/// Runs until a Stop item arrives or every sender is dropped.
pub(crate) async fn run_worker(
    api: Box<dyn ModemApi>,
    settings: DriverSettings,
    mut rx: mpsc::UnboundedReceiver<WorkItem>,
) {
    api.prime().await;
    log::info!("modem worker started");
    while let Some(item) = rx.recv().await {
        match item {
            WorkItem::ListInbox { reply } => {
                let res = api
                    .list_messages(BoxType::Inbound, 1, settings.page_size)
                    .await;
                let _ = reply.send(logged("list inbox", res));
            }
            WorkItem::ListOutbox { reply } => {
                let res = api
                    .list_messages(BoxType::Outbound, 1, settings.page_size)
                    .await;
                let _ = reply.send(logged("list outbox", res));
            }
            WorkItem::Send {
                numbers,
                text,
                reply,
            } => {
                let res = send_and_resolve(api.as_ref(), &settings, &numbers, &text).await;
                let _ = reply.send(logged("send", res));
            }
            WorkItem::Delete { index, reply } => {
                api.delete_message(index).await;
                let _ = reply.send(());
            }
            WorkItem::Stop { reply } => {
                log::info!("ending modem worker");
                let _ = reply.send(());
                return;
            }
        }
    }
    log::info!("modem worker queue closed");
}

fn logged<T>(op: &str, res: Result<T, ModemError>) -> Result<T, ModemError> {
    if let Err(ref e) = res {
        log::error!("modem {} failed: {}", op, e);
    }
    res
}
