//! In-process fakes for integration tests: a hilink modem web API and a playSMS callback.
//! Both are axum servers on free loopback ports, left running when the test ends.

#![allow(dead_code)]

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct StoredSms {
    pub index: u32,
    pub phone: String,
    pub content: String,
    pub sms_type: String,
}

pub fn plain(index: u32, phone: &str, content: &str) -> StoredSms {
    StoredSms {
        index,
        phone: phone.to_string(),
        content: content.to_string(),
        sms_type: "1".to_string(),
    }
}

/// A POST the fake modem received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub cookie: Option<String>,
    pub token: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug)]
pub struct ModemState {
    pub inbox: Vec<StoredSms>,
    pub outbox: Vec<StoredSms>,
    pub posts: Vec<Recorded>,
    pub primed: u32,
    pub next_index: u32,
    /// When false, sent messages never show up in the outbox.
    pub store_sent: bool,
    /// When true, SesTokInfo omits TokInfo.
    pub broken_session: bool,
    /// Message whose content gets a lone 0xE4 byte appended in listings.
    pub stray_byte_in: Option<u32>,
    issued: u32,
    live_tokens: HashSet<String>,
}

#[derive(Clone)]
pub struct FakeModem {
    pub base_url: String,
    pub state: Arc<Mutex<ModemState>>,
}

impl FakeModem {
    pub fn with<R>(&self, f: impl FnOnce(&mut ModemState) -> R) -> R {
        let mut g = self.state.lock().expect("modem state");
        f(&mut g)
    }

    pub fn inbox_indexes(&self) -> Vec<u32> {
        self.with(|s| s.inbox.iter().map(|m| m.index).collect())
    }

    pub fn outbox_indexes(&self) -> Vec<u32> {
        self.with(|s| s.outbox.iter().map(|m| m.index).collect())
    }

    pub fn posts_to(&self, path: &str) -> Vec<Recorded> {
        self.with(|s| s.posts.iter().filter(|r| r.path == path).cloned().collect())
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

pub async fn spawn_fake_modem(inbox: Vec<StoredSms>, outbox: Vec<StoredSms>) -> FakeModem {
    let state = Arc::new(Mutex::new(ModemState {
        inbox,
        outbox,
        posts: Vec::new(),
        primed: 0,
        next_index: 40100,
        store_sent: true,
        broken_session: false,
        stray_byte_in: None,
        issued: 0,
        live_tokens: HashSet::new(),
    }));
    let app = Router::new()
        .route("/html/index.html", get(landing))
        .route("/api/webserver/SesTokInfo", get(ses_tok_info))
        .route("/api/sms/sms-list", post(sms_list))
        .route("/api/sms/delete-sms", post(delete_sms))
        .route("/api/sms/send-sms", post(send_sms))
        .with_state(state.clone());
    let base_url = serve(app).await;
    FakeModem { base_url, state }
}

type Shared = State<Arc<Mutex<ModemState>>>;

async fn landing(State(state): Shared) -> &'static str {
    state.lock().expect("modem state").primed += 1;
    "<html></html>"
}

async fn ses_tok_info(State(state): Shared) -> String {
    let mut s = state.lock().expect("modem state");
    if s.broken_session {
        return "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<response><SesInfo>SessionID=broken</SesInfo></response>".to_string();
    }
    s.issued += 1;
    let n = s.issued;
    let token = format!("tok{}", n);
    s.live_tokens.insert(token.clone());
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<response><SesInfo>SessionID=sess{}</SesInfo><TokInfo>{}</TokInfo></response>",
        n, token
    )
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Record the request and consume its token. Err carries the modem's error envelope.
fn authorize(s: &mut ModemState, path: &str, headers: &HeaderMap, body: &str) -> Result<(), String> {
    let rec = Recorded {
        path: path.to_string(),
        cookie: header(headers, "cookie"),
        token: header(headers, "__RequestVerificationToken"),
        content_type: header(headers, "content-type"),
        body: body.to_string(),
    };
    let token_ok = rec
        .token
        .as_ref()
        .is_some_and(|t| s.live_tokens.remove(t));
    let cookie_ok = rec
        .cookie
        .as_ref()
        .is_some_and(|c| c.starts_with("SessionID="));
    s.posts.push(rec);
    if token_ok && cookie_ok {
        Ok(())
    } else {
        Err("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<error><code>125003</code><message></message></error>".to_string())
    }
}

fn tag(body: &str, name: &str) -> Option<String> {
    all_tags(body, name).into_iter().next()
}

fn all_tags(body: &str, name: &str) -> Vec<String> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let mut out = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(end) = after.find(&close) else { break };
        let raw = &after[..end];
        let value = quick_xml::escape::unescape(raw)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        out.push(value);
        rest = &after[end + close.len()..];
    }
    out
}

const STRAY_MARKER: &str = "@@stray@@";

fn render_list(messages: &[StoredSms], stray_byte_in: Option<u32>) -> Vec<u8> {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<response>\n<Count>{}</Count>\n<Messages>\n",
        messages.len()
    );
    for m in messages {
        xml.push_str(&format!(
            "<Message>\n<Smstat>0</Smstat>\n<Index>{}</Index>\n<Phone>{}</Phone>\n<Content>{}{}</Content>\n<Date>2017-05-01 10:00:00</Date>\n<Sca></Sca>\n<SaveType>4</SaveType>\n<Priority>0</Priority>\n<SmsType>{}</SmsType>\n</Message>\n",
            m.index,
            quick_xml::escape::escape(m.phone.as_str()),
            quick_xml::escape::escape(m.content.as_str()),
            if stray_byte_in == Some(m.index) { STRAY_MARKER } else { "" },
            m.sms_type
        ));
    }
    xml.push_str("</Messages>\n</response>\n");
    match xml.split_once(STRAY_MARKER) {
        Some((head, tail)) => [head.as_bytes(), &[0xE4u8][..], tail.as_bytes()].concat(),
        None => xml.into_bytes(),
    }
}

/// Served like the device does: raw UTF-8 bytes labelled `text/html` with no charset.
async fn sms_list(State(state): Shared, headers: HeaderMap, body: String) -> Response {
    let mut s = state.lock().expect("modem state");
    if let Err(e) = authorize(&mut s, "/api/sms/sms-list", &headers, &body) {
        return e.into_response();
    }
    let count: usize = tag(&body, "ReadCount")
        .and_then(|c| c.parse().ok())
        .unwrap_or(20);
    let source = match tag(&body, "BoxType").as_deref() {
        Some("2") => &s.outbox,
        _ => &s.inbox,
    };
    let page: Vec<StoredSms> = source.iter().take(count).cloned().collect();
    (
        [(header::CONTENT_TYPE, "text/html")],
        render_list(&page, s.stray_byte_in),
    )
        .into_response()
}

async fn delete_sms(State(state): Shared, headers: HeaderMap, body: String) -> String {
    let mut s = state.lock().expect("modem state");
    if let Err(e) = authorize(&mut s, "/api/sms/delete-sms", &headers, &body) {
        return e;
    }
    if let Some(index) = tag(&body, "Index").and_then(|i| i.parse::<u32>().ok()) {
        s.inbox.retain(|m| m.index != index);
        s.outbox.retain(|m| m.index != index);
    }
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<response>OK</response>\n".to_string()
}

async fn send_sms(State(state): Shared, headers: HeaderMap, body: String) -> String {
    let mut s = state.lock().expect("modem state");
    if let Err(e) = authorize(&mut s, "/api/sms/send-sms", &headers, &body) {
        return e;
    }
    if s.store_sent {
        s.next_index += 1;
        let sent = StoredSms {
            index: s.next_index,
            phone: all_tags(&body, "Phone").join(";"),
            content: tag(&body, "Content").unwrap_or_default(),
            sms_type: "1".to_string(),
        };
        s.outbox.insert(0, sent);
    }
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<response>OK</response>\n".to_string()
}

/// Fake playSMS generic gateway callback.
#[derive(Clone)]
pub struct FakePlaySms {
    pub callback_url: String,
    pub calls: Arc<Mutex<Vec<Vec<(String, String)>>>>,
    pub status: Arc<Mutex<StatusCode>>,
}

impl FakePlaySms {
    pub fn calls(&self) -> Vec<Vec<(String, String)>> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn set_status(&self, status: StatusCode) {
        *self.status.lock().expect("status") = status;
    }
}

pub fn param<'a>(call: &'a [(String, String)], key: &str) -> Option<&'a str> {
    call.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub async fn spawn_fake_playsms() -> FakePlaySms {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let status = Arc::new(Mutex::new(StatusCode::OK));
    let state = (calls.clone(), status.clone());
    let app = Router::new()
        .route("/playsms/plugin/gateway/generic/callback.php", get(callback))
        .with_state(state);
    let base = serve(app).await;
    FakePlaySms {
        callback_url: format!("{}/playsms/plugin/gateway/generic/callback.php", base),
        calls,
        status,
    }
}

type CallbackState = (
    Arc<Mutex<Vec<Vec<(String, String)>>>>,
    Arc<Mutex<StatusCode>>,
);

async fn callback(
    State((calls, status)): State<CallbackState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, &'static str) {
    let pairs: Vec<(String, String)> =
        url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
            .into_owned()
            .collect();
    calls.lock().expect("calls").push(pairs);
    let code = *status.lock().expect("status");
    (code, "OK")
}
