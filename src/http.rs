// Blocking request executor. One call sends one GET or POST, waits for the
// whole body and hands back everything the caller may want: status, content
// type, cookies and, for JSON replies, the decoded value tree.

use std::fmt;
use std::str::FromStr;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::json::{self, JsonValue};
use crate::multipart::MultipartBody;

/// Content type that triggers eager JSON decoding. Compared exactly.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// The two HTTP methods the API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            _ => Err(Error::InvalidRequest(format!("method must be GET or POST, got '{s}'"))),
        }
    }
}

/// A cookie as received in `Set-Cookie`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }
}

impl<'a> From<reqwest::cookie::Cookie<'a>> for SessionCookie {
    fn from(cookie: reqwest::cookie::Cookie<'a>) -> Self {
        Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            domain: cookie.domain().map(str::to_string),
            path: cookie.path().map(str::to_string),
        }
    }
}

/// Ordered cookie collection. Held by the caller after login and attached
/// to later requests; the executor only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieSet {
    cookies: Vec<SessionCookie>,
}

impl CookieSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie, replacing any earlier cookie with the same name.
    pub fn insert(&mut self, cookie: SessionCookie) {
        match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SessionCookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionCookie> {
        self.cookies.iter()
    }

    /// Value for a request `Cookie` header: `a=1; b=2`.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl FromIterator<SessionCookie> for CookieSet {
    fn from_iter<I: IntoIterator<Item = SessionCookie>>(iter: I) -> Self {
        let mut set = CookieSet::new();
        for cookie in iter {
            set.insert(cookie);
        }
        set
    }
}

/// Everything captured from one response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub cookies: CookieSet,
    pub body: Vec<u8>,
    /// Present only when the content type is exactly `application/json`
    /// and the body parses.
    pub json: Option<JsonValue>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_json(&self) -> bool {
        self.content_type.as_deref() == Some(JSON_CONTENT_TYPE)
    }

    /// The decoded JSON. A body declared as JSON that does not parse is
    /// `Error::Json`; any other body is `UnexpectedResponse`.
    pub fn into_json(self) -> Result<JsonValue> {
        let declared_json = self.is_json();
        match self.json {
            Some(value) => Ok(value),
            None if declared_json => json::decode(&self.body),
            None => Err(Error::UnexpectedResponse {
                status: self.status,
                content_type: self.content_type,
            }),
        }
    }
}

/// Sends requests over a shared reqwest blocking client. Keeps no state
/// between calls, so one executor can serve several threads.
#[derive(Debug, Clone)]
pub struct Executor {
    client: Client,
}

impl Executor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Send one request. HTTP error statuses and malformed JSON bodies are
    /// returned as data, cookies included; only failures to get a response
    /// at all are `Error::Transport`.
    pub fn execute(
        &self,
        method: Method,
        uri: &str,
        body: Option<MultipartBody>,
        cookies: Option<&CookieSet>,
    ) -> Result<RawResponse> {
        if uri.trim().is_empty() {
            return Err(Error::InvalidRequest("uri must not be empty".into()));
        }
        let url = Url::parse(uri)
            .map_err(|e| Error::InvalidRequest(format!("invalid uri '{uri}': {e}")))?;

        let mut request = match method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
        };
        let cookie_count = cookies.map_or(0, CookieSet::len);
        if let Some(cookies) = cookies.filter(|c| !c.is_empty()) {
            request = request.header(COOKIE, cookies.header_value());
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, body.content_type).body(body.bytes);
        }

        debug!("{} {} ({} cookies attached)", method, url, cookie_count);
        let transport = |source| Error::Transport {
            url: url.to_string(),
            source,
        };
        let response = request.send().map_err(transport)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let received: CookieSet = response.cookies().map(SessionCookie::from).collect();
        let body = response.bytes().map_err(transport)?.to_vec();

        debug!(
            "{} {} -> {} [{}] cookies: {:?}",
            method,
            url,
            status,
            content_type.as_deref().unwrap_or("-"),
            received.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );

        let mut response = RawResponse {
            status,
            content_type,
            cookies: received,
            body,
            json: None,
        };
        if response.is_json() {
            match json::decode(&response.body) {
                Ok(value) => response.json = Some(value),
                Err(e) => warn!("{} {} declared JSON but sent a malformed body: {}", method, url, e),
            }
        }
        Ok(response)
    }
}
