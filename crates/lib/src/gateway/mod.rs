//! Gateway: HTTP front for playSMS plus the daemon wiring (driver, poller, server).
//!
//! playSMS's generic gateway plugin calls `GET /api/send_sms?msisdn=..&message=..` to send;
//! received SMS flow the other way through the inbox poller.

mod server;

pub use server::{router, run_gateway, GatewayState};
