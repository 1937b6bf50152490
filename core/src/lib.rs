//! HTTP redirect following over a pluggable transport.
//!
//! # Overview
//! Given one request and a way to perform a single HTTP exchange, produce
//! the final non-redirect response by following zero or more `Location`
//! redirects. The core never opens connections: the caller's `Transport`
//! performs every hop, and the redirect state machine only decides what the
//! next hop looks like.
//!
//! # Design
//! - `RedirectChain` is a sans-IO state machine (request out, status and
//!   headers in), so it can be driven by `RedirectClient` or from across
//!   the C ABI with a host-owned transport.
//! - `policy` decides method and body fate per status, `origin` compares
//!   origins, `projector` derives the next hop's headers. All three are
//!   pure functions.
//! - Request bodies are shared `BodyProducer` handles: a 307/308 hop gets the
//!   very same producer, a downgraded hop gets none.
//! - Transport errors are passed through untouched inside `FollowError`.

pub mod chain;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod origin;
pub mod policy;
pub mod projector;

pub use chain::{ChainState, Decision, Hop, RedirectChain};
pub use client::{follow_redirects, RedirectClient, Transport};
pub use config::{RedirectConfig, DEFAULT_MAX_HOPS, DEFAULT_SENSITIVE_HEADERS};
pub use error::{ConfigError, FollowError, ParseMethodError, RedirectError};
pub use headers::HeaderList;
pub use http::{BodyProducer, BodyStream, HttpMethod, HttpRequest, HttpResponse};
pub use origin::same_origin;
pub use policy::{decide, BodyDisposition, RedirectAction};
pub use projector::project;

pub use url::Url;
