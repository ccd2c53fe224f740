//! Caller-facing handle: the five operations the rest of the program may use.

use crate::driver::worker::{run_worker, WorkItem};
use crate::driver::DriverSettings;
use crate::modem::{Message, MessageIndex, ModemApi, ModemError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Handle to the modem worker. Clone freely; all clones feed the same queue.
#[derive(Clone)]
pub struct ModemDriver {
    tx: mpsc::UnboundedSender<WorkItem>,
}

impl ModemDriver {
    /// Spawn the worker task that owns `api`. The join handle resolves once the worker has stopped.
    pub fn spawn<A>(api: A, settings: DriverSettings) -> (Self, JoinHandle<()>)
    where
        A: ModemApi + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(Box::new(api), settings, rx));
        (Self { tx }, handle)
    }

    /// Enqueue without waiting; the receiver yields the result once the worker gets to it.
    fn submit<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> WorkItem,
    ) -> Result<oneshot::Receiver<T>, ModemError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| ModemError::WorkerStopped)?;
        Ok(rx)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> WorkItem,
    ) -> Result<T, ModemError> {
        self.submit(make)?
            .await
            .map_err(|_| ModemError::WorkerStopped)
    }

    /// Up to one page of received SMS, newest first.
    pub async fn list_received_sms(&self) -> Result<Vec<Message>, ModemError> {
        self.request(|reply| WorkItem::ListInbox { reply }).await?
    }

    /// Up to one page of the outbox, newest first.
    pub async fn list_sent_sms(&self) -> Result<Vec<Message>, ModemError> {
        self.request(|reply| WorkItem::ListOutbox { reply }).await?
    }

    /// Send `text` to `numbers` and return the index the modem gave it, or `None` when it
    /// could not be recovered within the settle window.
    pub async fn send_sms(
        &self,
        numbers: Vec<String>,
        text: String,
    ) -> Result<Option<MessageIndex>, ModemError> {
        if numbers.is_empty() {
            return Err(ModemError::NoRecipients);
        }
        self.request(|reply| WorkItem::Send {
            numbers,
            text,
            reply,
        })
        .await?
    }

    /// Best-effort delete; only fails when the worker is gone.
    pub async fn delete_sms(&self, index: MessageIndex) -> Result<(), ModemError> {
        self.request(|reply| WorkItem::Delete { index, reply }).await
    }

    /// Stop the worker once everything queued before this call has run.
    pub async fn stop(&self) -> Result<(), ModemError> {
        self.request(|reply| WorkItem::Stop { reply }).await
    }
}
