//! Redirect-following client over a pluggable transport.
//!
//! # Design
//! `RedirectClient` holds only a `RedirectConfig` and carries no state
//! between calls; each `follow` builds its own `RedirectChain`, so one client
//! can serve any number of independent chains. The network round-trip lives
//! behind `Transport`, which is also the seam tests substitute with a
//! scripted double.

use tracing::warn;
use url::Url;

use crate::chain::{Decision, RedirectChain};
use crate::config::RedirectConfig;
use crate::error::FollowError;
use crate::headers::HeaderList;
use crate::http::{BodyProducer, HttpMethod, HttpRequest, HttpResponse};

/// Performs single HTTP exchanges on behalf of a redirect chain.
pub trait Transport {
    /// Response body stream, forwarded untouched to the caller on the final
    /// hop.
    type Body;
    type Error: std::error::Error;

    /// Send one request and return the response head with an unread body.
    /// Called exactly once per hop.
    fn perform(&mut self, request: &HttpRequest) -> Result<HttpResponse<Self::Body>, Self::Error>;

    /// Release a response that is being redirected away from, draining its
    /// body if the connection is to be reused.
    fn discard(&mut self, response: HttpResponse<Self::Body>) -> Result<(), Self::Error>;
}

/// Follows redirects for requests sent through a `Transport`.
#[derive(Debug, Clone, Default)]
pub struct RedirectClient {
    config: RedirectConfig,
}

impl RedirectClient {
    pub fn new(config: RedirectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RedirectConfig {
        &self.config
    }

    /// Send `request` and follow redirects until a non-redirect response.
    ///
    /// Returns that response with its body unread. Fails with
    /// `TooManyRedirects` once more than `max_hops` redirects would be
    /// needed, with `InvalidRedirectTarget` for a redirect without a usable
    /// `Location`, and passes transport errors through unchanged.
    pub fn follow<T: Transport>(
        &self,
        transport: &mut T,
        request: HttpRequest,
    ) -> Result<HttpResponse<T::Body>, FollowError<T::Error>> {
        let mut chain = RedirectChain::new(request, self.config.clone());
        loop {
            let request = chain.next_request()?;
            let response = transport.perform(request).map_err(FollowError::Transport)?;
            match chain.on_response(response.status, &response.headers) {
                Ok(Decision::Return) => return Ok(response),
                Ok(Decision::Follow(_)) => {
                    transport.discard(response).map_err(FollowError::Transport)?;
                }
                Err(err) => {
                    if let Err(drain) = transport.discard(response) {
                        warn!(error = %drain, "failed to drain redirect response after chain error");
                    }
                    return Err(err.into());
                }
            }
        }
    }
}

/// Send one request described by its parts and follow redirects, using the
/// default credential list and a hop bound of `max_hops`.
pub fn follow_redirects<T: Transport>(
    transport: &mut T,
    method: HttpMethod,
    url: Url,
    headers: HeaderList,
    body: Option<BodyProducer>,
    max_hops: usize,
) -> Result<HttpResponse<T::Body>, FollowError<T::Error>> {
    let request = HttpRequest {
        method,
        url,
        headers,
        body,
    };
    RedirectClient::new(RedirectConfig::default().with_max_hops(max_hops)).follow(transport, request)
}
