//! Hilink SMS core library: modem protocol, serialized driver, inbox poller, playSMS
//! callback and the HTTP gateway used by the CLI.

pub mod config;
pub mod driver;
pub mod gateway;
pub mod modem;
pub mod platform;
pub mod poller;
