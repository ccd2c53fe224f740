//! XML bodies for the hilink web API: request builders and response parsers.
//!
//! Requests are small fixed documents and are written by hand. Responses go through
//! quick-xml's serde support; the root element is checked first because the modem answers
//! every endpoint with either `<response>` or an `<error><code>..</code></error>` envelope.

use crate::modem::error::ModemError;
use crate::modem::message::{BoxType, Message, MessageIndex, PLAIN_SMS_TYPE};
use crate::modem::session::Session;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use serde::Deserialize;

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Body for POST /api/sms/sms-list. Newest first, no unread preference.
pub fn sms_list_request(box_type: BoxType, page: u32, count: u32) -> String {
    format!(
        "{XML_HEADER}<request>\n  <PageIndex>{page}</PageIndex>\n  <ReadCount>{count}</ReadCount>\n  <BoxType>{}</BoxType>\n  <SortType>0</SortType>\n  <Ascending>0</Ascending>\n  <UnreadPreferred>0</UnreadPreferred>\n</request>\n",
        box_type.wire_value()
    )
}

/// Body for POST /api/sms/delete-sms.
pub fn delete_sms_request(index: MessageIndex) -> String {
    format!("{XML_HEADER}<request>\n  <Index>{index}</Index>\n</request>\n")
}

/// Body for POST /api/sms/send-sms. Index -1 lets the modem pick the slot; Length is the char count of the text.
pub fn send_sms_request(numbers: &[String], text: &str, date: &str) -> String {
    let mut body = String::with_capacity(256 + text.len());
    body.push_str(XML_HEADER);
    body.push_str("<request>\n  <Index>-1</Index>\n  <Phones>\n");
    for number in numbers {
        body.push_str(&format!("    <Phone>{}</Phone>\n", escape(number.as_str())));
    }
    body.push_str("  </Phones>\n  <Sca></Sca>\n");
    body.push_str(&format!("  <Content>{}</Content>\n", escape(text)));
    body.push_str(&format!("  <Length>{}</Length>\n", text.chars().count()));
    body.push_str("  <Reserved>1</Reserved>\n");
    body.push_str(&format!("  <Date>{}</Date>\n", escape(date)));
    body.push_str("</request>\n");
    body
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SesTokInfo {
    #[serde(rename = "SesInfo", default)]
    ses_info: Option<String>,
    #[serde(rename = "TokInfo", default)]
    tok_info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SmsListResponse {
    #[serde(rename = "Messages", default)]
    messages: Option<MessageBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageBlock {
    // a lone <Message> lands here as a one-element Vec
    #[serde(rename = "Message", default)]
    items: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "Index")]
    index: String,
    #[serde(rename = "Phone", default)]
    phone: Option<String>,
    #[serde(rename = "Content", default)]
    content: Option<String>,
    #[serde(rename = "SmsType", default)]
    sms_type: Option<String>,
}

/// Local name of the document's root element.
fn root_name(xml: &str) -> Result<String, ModemError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err(ModemError::protocol("empty XML document")),
            Err(e) => return Err(ModemError::protocol(format!("XML parse error: {}", e))),
            _ => {}
        }
    }
}

/// Fails with `Api` for an `<error>` envelope and with `Protocol` for anything but `<response>`.
pub fn check_envelope(xml: &str) -> Result<(), ModemError> {
    match root_name(xml)?.as_str() {
        "response" => Ok(()),
        "error" => {
            let env: ErrorEnvelope = quick_xml::de::from_str(xml)
                .map_err(|e| ModemError::protocol(format!("bad error envelope: {}", e)))?;
            Err(ModemError::Api {
                code: env.code.unwrap_or_else(|| "unknown".to_string()),
            })
        }
        other => Err(ModemError::protocol(format!("unexpected root element <{}>", other))),
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse the SesTokInfo response into a session.
pub fn parse_session(xml: &str) -> Result<Session, ModemError> {
    check_envelope(xml)?;
    let info: SesTokInfo = quick_xml::de::from_str(xml)
        .map_err(|e| ModemError::protocol(format!("bad SesTokInfo response: {}", e)))?;
    let cookie = non_empty(info.ses_info).ok_or_else(|| ModemError::protocol("SesInfo missing"))?;
    let token = non_empty(info.tok_info).ok_or_else(|| ModemError::protocol("TokInfo missing"))?;
    Ok(Session { cookie, token })
}

/// Parse an sms-list response, keeping only plain SMS in server order.
pub fn parse_message_list(xml: &str, box_type: BoxType) -> Result<Vec<Message>, ModemError> {
    check_envelope(xml)?;
    let list: SmsListResponse = quick_xml::de::from_str(xml)
        .map_err(|e| ModemError::protocol(format!("bad sms-list response: {}", e)))?;
    let items = list.messages.unwrap_or_default().items;
    let mut out = Vec::with_capacity(items.len());
    for raw in items {
        let sms_type = raw.sms_type.unwrap_or_default();
        if sms_type.trim() != PLAIN_SMS_TYPE {
            log::debug!("skipping message {} with SmsType {:?}", raw.index, sms_type);
            continue;
        }
        let index: MessageIndex = raw
            .index
            .trim()
            .parse()
            .map_err(|_| ModemError::protocol(format!("non-numeric Index {:?}", raw.index)))?;
        let content = match raw.content {
            Some(c) if !c.is_empty() => c,
            _ => " ".to_string(),
        };
        out.push(Message {
            index,
            phone: raw.phone.unwrap_or_default(),
            content,
            box_type,
            sms_type: PLAIN_SMS_TYPE.to_string(),
        });
    }
    Ok(out)
}
