//! SMS records as seen in the modem's inbox and outbox.

use serde::Serialize;

/// Modem-assigned ordinal, unique within a box.
pub type MessageIndex = u32;

/// SmsType of an ordinary text message; other values are status reports and the like.
pub const PLAIN_SMS_TYPE: &str = "1";

/// Which message store a listing targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxType {
    Inbound,
    Outbound,
}

impl BoxType {
    /// BoxType value in sms-list requests.
    pub fn wire_value(self) -> u8 {
        match self {
            BoxType::Inbound => 1,
            BoxType::Outbound => 2,
        }
    }
}

/// One SMS stored on the modem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub index: MessageIndex,
    pub phone: String,
    pub content: String,
    #[serde(rename = "box")]
    pub box_type: BoxType,
    pub sms_type: String,
}

/// Decode a modem response body as UTF-8, dropping byte sequences that do not decode.
pub fn decode_utf8_dropping_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let skip = e.error_len().unwrap_or(rest.len());
                bytes = &rest[skip..];
            }
        }
    }
}
