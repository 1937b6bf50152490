//! HTTP request/response descriptors passed between the redirect chain and
//! a transport.
//!
//! # Design
//! These types describe one hop as plain data. The redirect core builds an
//! `HttpRequest` for every hop and reads `HttpResponse` status and headers,
//! but never touches the network or the body bytes itself. The transport
//! (host) opens connections, streams request bodies and owns the response
//! body type.
//!
//! Request bodies are `BodyProducer` handles rather than byte buffers. A
//! producer is a function that yields a fresh chunk stream each time a
//! transport asks for one, so replaying a body on a 307/308 hop means handing
//! the same producer to the next hop, never rewinding a stream that was
//! already consumed.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ParseMethodError;
use crate::headers::HeaderList;

/// HTTP method for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
    Connect,
    /// Any other valid method token, kept verbatim.
    Extension(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Extension(token) => token,
        }
    }

    /// GET and HEAD: methods that retrieve rather than mutate. A legacy
    /// redirect (301/302/303) leaves these untouched.
    pub fn is_retrieval(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    /// Method names are case-sensitive; `"get"` is an extension method.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s {
            "GET" => HttpMethod::Get,
            "HEAD" => HttpMethod::Head,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "OPTIONS" => HttpMethod::Options,
            "TRACE" => HttpMethod::Trace,
            "CONNECT" => HttpMethod::Connect,
            other if is_token(other) => HttpMethod::Extension(other.to_string()),
            other => return Err(ParseMethodError(other.to_string())),
        };
        Ok(method)
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = ParseMethodError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(m: HttpMethod) -> Self {
        m.as_str().to_string()
    }
}

/// RFC 7230 `token`: one or more tchars.
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}

/// A lazy stream of request body chunks.
pub type BodyStream = Box<dyn Iterator<Item = Bytes> + Send>;

/// Shared handle to a request body source.
///
/// Cloning the handle does not copy the body; both clones refer to the same
/// producer and compare equal under `same_as`. Each call to `stream` runs the
/// producer again and returns a new chunk stream.
#[derive(Clone)]
pub struct BodyProducer {
    produce: Arc<dyn Fn() -> BodyStream + Send + Sync>,
}

impl BodyProducer {
    pub fn new<F, I>(produce: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self {
            produce: Arc::new(move || Box::new(produce().into_iter()) as BodyStream),
        }
    }

    /// A producer that yields `bytes` as a single chunk.
    pub fn full(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::new(move || std::iter::once(bytes.clone()))
    }

    /// A producer that yields the given chunks in order.
    pub fn chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Bytes>,
    {
        let chunks: Vec<Bytes> = chunks.into_iter().map(Into::into).collect();
        Self::new(move || chunks.clone())
    }

    /// Start a fresh pass over the body. Called by transports only.
    pub fn stream(&self) -> BodyStream {
        (self.produce)()
    }

    /// Whether `other` is a handle to this very producer.
    pub fn same_as(&self, other: &BodyProducer) -> bool {
        Arc::ptr_eq(&self.produce, &other.produce)
    }
}

impl fmt::Debug for BodyProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyProducer")
            .field("ptr", &Arc::as_ptr(&self.produce))
            .finish()
    }
}

/// One hop's request.
///
/// `B` is the body handle. Rust callers use `BodyProducer`; a host that
/// keeps the body on its own side can use `()` and read `body.is_some()` as
/// "send the original body again".
#[derive(Debug, Clone)]
pub struct HttpRequest<B = BodyProducer> {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderList,
    pub body: Option<B>,
}

impl<B> HttpRequest<B> {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderList::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderList) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }
}

/// One hop's response. The body type belongs to the transport.
#[derive(Debug, Clone)]
pub struct HttpResponse<B> {
    pub status: u16,
    pub headers: HeaderList,
    pub body: B,
}

impl<B> HttpResponse<B> {
    pub fn new(status: u16, body: B) -> Self {
        Self {
            status,
            headers: HeaderList::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }
}
