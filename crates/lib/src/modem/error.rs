//! Errors surfaced by the modem protocol layer and the driver.

#[derive(Debug, thiserror::Error)]
pub enum ModemError {
    /// Socket/HTTP failure reaching the modem (including transport timeouts).
    #[error("modem request failed: {0}")]
    Connectivity(#[from] reqwest::Error),
    /// Malformed or structurally unexpected XML, missing session fields.
    #[error("modem protocol error: {0}")]
    Protocol(String),
    /// The modem answered with an `<error>` envelope or a non-2xx status.
    #[error("modem api error: {code}")]
    Api { code: String },
    #[error("send request has no destination numbers")]
    NoRecipients,
    #[error("modem worker has stopped")]
    WorkerStopped,
}

impl ModemError {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        ModemError::Protocol(msg.into())
    }
}
