//! Sans-IO redirect chain state machine.
//!
//! # Design
//! `RedirectChain` owns everything one chain needs (hop count, the current
//! request, the history) and nothing else, so independent chains never share
//! state. It does no I/O: the driver takes the request from `next_request`,
//! performs it however it likes, and reports status and headers back through
//! `on_response`. `RedirectClient` is one such driver; the C ABI is another.
//!
//! ```text
//! Issuing --next_request--> AwaitingDecision --on_response--> Terminal
//!    ^                              |                    \--> Failed
//!    +-------- Follow --------------+
//! ```

use tracing::{debug, warn};
use url::Url;

use crate::config::RedirectConfig;
use crate::error::RedirectError;
use crate::headers::HeaderList;
use crate::http::{HttpMethod, HttpRequest};
use crate::origin::same_origin;
use crate::policy::{self, BodyDisposition};
use crate::projector;

/// Where a chain is in its lifecycle. `Terminal` and `Failed` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Issuing,
    AwaitingDecision,
    Terminal,
    Failed,
}

/// A redirect that was followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub status: u16,
    pub from: Url,
    pub to: Url,
    pub method: HttpMethod,
    pub cross_origin: bool,
    pub body_kept: bool,
}

/// What the driver should do with the response it just reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Not a redirect: hand the response to the caller as is.
    Return,
    /// A redirect was accepted. Discard the response, then issue
    /// `next_request()`.
    Follow(Hop),
}

/// State of one redirect chain.
#[derive(Debug)]
pub struct RedirectChain<B> {
    config: RedirectConfig,
    state: ChainState,
    hops_taken: usize,
    current: HttpRequest<B>,
    history: Vec<Hop>,
}

impl<B: Clone> RedirectChain<B> {
    pub fn new(request: HttpRequest<B>, config: RedirectConfig) -> Self {
        Self {
            config,
            state: ChainState::Issuing,
            hops_taken: 0,
            current: request,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn hops_taken(&self) -> usize {
        self.hops_taken
    }

    pub fn max_hops(&self) -> usize {
        self.config.max_hops
    }

    /// The request for the current hop, whatever the state.
    pub fn current(&self) -> &HttpRequest<B> {
        &self.current
    }

    /// Redirects followed so far, oldest first.
    pub fn history(&self) -> &[Hop] {
        &self.history
    }

    /// Take the request to send for this hop.
    pub fn next_request(&mut self) -> Result<&HttpRequest<B>, RedirectError> {
        if self.state != ChainState::Issuing {
            return Err(RedirectError::UnexpectedState { state: self.state });
        }
        self.state = ChainState::AwaitingDecision;
        debug!(
            method = %self.current.method,
            url = %self.current.url,
            hop = self.hops_taken,
            "issuing request"
        );
        Ok(&self.current)
    }

    /// Feed the status and headers of the response to the request returned
    /// by `next_request`.
    pub fn on_response(
        &mut self,
        status: u16,
        headers: &HeaderList,
    ) -> Result<Decision, RedirectError> {
        if self.state != ChainState::AwaitingDecision {
            return Err(RedirectError::UnexpectedState { state: self.state });
        }

        let Some(action) = policy::decide(status, &self.current.method) else {
            self.state = ChainState::Terminal;
            return Ok(Decision::Return);
        };

        if self.hops_taken >= self.config.max_hops {
            warn!(
                max_hops = self.config.max_hops,
                url = %self.current.url,
                "redirect limit reached"
            );
            return Err(self.fail(RedirectError::TooManyRedirects {
                max_hops: self.config.max_hops,
            }));
        }

        let location = headers.get("location");
        let Some(target) = location.and_then(|loc| resolve_location(&self.current.url, loc)) else {
            warn!(status, location = ?location, url = %self.current.url, "unusable redirect target");
            return Err(self.fail(RedirectError::InvalidRedirectTarget {
                status,
                location: location.map(str::to_string),
            }));
        };

        let cross_origin = !same_origin(&self.current.url, &target);
        let body_dropped = action.body == BodyDisposition::Drop;
        let headers = projector::project(
            &self.current.headers,
            body_dropped,
            cross_origin,
            &target,
            &self.config,
        );
        let body = if body_dropped {
            None
        } else {
            self.current.body.clone()
        };

        let hop = Hop {
            status,
            from: self.current.url.clone(),
            to: target.clone(),
            method: action.method.clone(),
            cross_origin,
            body_kept: body.is_some(),
        };
        debug!(
            status,
            from = %hop.from,
            to = %hop.to,
            method = %hop.method,
            cross_origin,
            body_kept = hop.body_kept,
            "following redirect"
        );

        self.current = HttpRequest {
            method: action.method,
            url: target,
            headers,
            body,
        };
        self.hops_taken += 1;
        self.history.push(hop.clone());
        self.state = ChainState::Issuing;
        Ok(Decision::Follow(hop))
    }

    fn fail(&mut self, err: RedirectError) -> RedirectError {
        self.state = ChainState::Failed;
        err
    }
}

/// Resolve a `Location` value against the URL that produced it.
///
/// Only http(s) targets are followed. A target without a fragment inherits
/// the current one (RFC 7231 section 7.1.2).
fn resolve_location(current: &Url, location: &str) -> Option<Url> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    let mut target = current.join(location).ok()?;
    if !matches!(target.scheme(), "http" | "https") {
        return None;
    }
    if target.fragment().is_none() {
        target.set_fragment(current.fragment());
    }
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::BodyProducer;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn location(value: &str) -> HeaderList {
        [("Location", value)].into_iter().collect()
    }

    fn post_chain(config: RedirectConfig) -> RedirectChain<BodyProducer> {
        let req = HttpRequest::new(HttpMethod::Post, url("http://localhost:8080/a"))
            .with_header("content-length", "3")
            .with_header("Authorization", "the-key")
            .with_body(BodyProducer::chunks(["a", "b", "c"]));
        RedirectChain::new(req, config)
    }

    #[test]
    fn starts_issuing_with_zero_hops() {
        let chain = post_chain(RedirectConfig::default());
        assert_eq!(chain.state(), ChainState::Issuing);
        assert_eq!(chain.hops_taken(), 0);
        assert!(chain.history().is_empty());
    }

    #[test]
    fn non_redirect_is_terminal() {
        let mut chain = post_chain(RedirectConfig::default());
        chain.next_request().unwrap();
        let decision = chain.on_response(200, &HeaderList::new()).unwrap();
        assert_eq!(decision, Decision::Return);
        assert_eq!(chain.state(), ChainState::Terminal);
    }

    #[test]
    fn terminal_chain_rejects_further_use() {
        let mut chain = post_chain(RedirectConfig::default());
        chain.next_request().unwrap();
        chain.on_response(404, &HeaderList::new()).unwrap();
        assert_eq!(
            chain.next_request().unwrap_err(),
            RedirectError::UnexpectedState {
                state: ChainState::Terminal
            }
        );
        assert!(chain.on_response(200, &HeaderList::new()).is_err());
    }

    #[test]
    fn response_before_request_is_rejected() {
        let mut chain = post_chain(RedirectConfig::default());
        let err = chain.on_response(200, &HeaderList::new()).unwrap_err();
        assert_eq!(
            err,
            RedirectError::UnexpectedState {
                state: ChainState::Issuing
            }
        );
    }

    #[test]
    fn relative_location_resolves_against_current_url() {
        let mut chain = post_chain(RedirectConfig::default());
        chain.next_request().unwrap();
        chain.on_response(307, &location("/b")).unwrap();
        assert_eq!(chain.current().url.as_str(), "http://localhost:8080/b");

        chain.next_request().unwrap();
        chain.on_response(307, &location("c?x=1")).unwrap();
        assert_eq!(chain.current().url.as_str(), "http://localhost:8080/c?x=1");
    }

    #[test]
    fn legacy_redirect_downgrades_post_and_drops_body() {
        let mut chain = post_chain(RedirectConfig::default());
        chain.next_request().unwrap();
        let decision = chain.on_response(301, &location("/b")).unwrap();
        let Decision::Follow(hop) = decision else {
            panic!("expected a redirect");
        };
        assert!(!hop.body_kept);
        let next = chain.next_request().unwrap();
        assert_eq!(next.method, HttpMethod::Get);
        assert!(next.body.is_none());
        assert!(!next.headers.contains("content-length"));
        assert_eq!(next.headers.get("authorization"), Some("the-key"));
    }

    #[test]
    fn temporary_redirect_replays_the_same_producer() {
        let mut chain = post_chain(RedirectConfig::default());
        let original = chain.next_request().unwrap().body.clone().unwrap();
        chain.on_response(307, &location("/b")).unwrap();
        chain.next_request().unwrap();
        chain.on_response(308, &location("/c")).unwrap();
        let next = chain.next_request().unwrap();
        assert_eq!(next.method, HttpMethod::Post);
        assert!(next.body.as_ref().unwrap().same_as(&original));
        assert_eq!(next.headers.get("content-length"), Some("3"));
    }

    #[test]
    fn cross_origin_hop_strips_authorization() {
        let mut chain = post_chain(RedirectConfig::default());
        chain.next_request().unwrap();
        let decision = chain
            .on_response(307, &location("http://anotherhost.com:8080/b"))
            .unwrap();
        assert!(matches!(decision, Decision::Follow(Hop { cross_origin: true, .. })));
        let next = chain.next_request().unwrap();
        assert!(!next.headers.contains("authorization"));
        assert_eq!(next.headers.get("content-length"), Some("3"));
    }

    #[test]
    fn credentials_stay_stripped_after_returning_to_origin() {
        let mut chain = post_chain(RedirectConfig::default());
        chain.next_request().unwrap();
        chain.on_response(307, &location("http://other:8080/b")).unwrap();
        chain.next_request().unwrap();
        chain.on_response(307, &location("http://localhost:8080/c")).unwrap();
        assert!(!chain.current().headers.contains("authorization"));
    }

    #[test]
    fn exceeding_max_hops_fails() {
        let mut chain = post_chain(RedirectConfig::default().with_max_hops(2));
        assert_eq!(chain.max_hops(), 2);
        for _ in 0..2 {
            chain.next_request().unwrap();
            chain.on_response(307, &location("/loop")).unwrap();
        }
        chain.next_request().unwrap();
        let err = chain.on_response(307, &location("/loop")).unwrap_err();
        assert_eq!(err, RedirectError::TooManyRedirects { max_hops: 2 });
        assert_eq!(chain.state(), ChainState::Failed);
        assert_eq!(chain.hops_taken(), 2);
    }

    #[test]
    fn zero_max_hops_still_returns_terminal_responses() {
        let mut chain = post_chain(RedirectConfig::default().with_max_hops(0));
        chain.next_request().unwrap();
        assert_eq!(chain.on_response(200, &HeaderList::new()).unwrap(), Decision::Return);
    }

    #[test]
    fn missing_location_is_invalid_target() {
        let mut chain = post_chain(RedirectConfig::default());
        chain.next_request().unwrap();
        let err = chain.on_response(302, &HeaderList::new()).unwrap_err();
        assert_eq!(
            err,
            RedirectError::InvalidRedirectTarget {
                status: 302,
                location: None
            }
        );
        assert_eq!(chain.state(), ChainState::Failed);
    }

    #[test]
    fn unparsable_or_non_http_location_is_invalid_target() {
        for bad in ["http://[::1", "   ", "mailto:someone@example.com", "ftp://example.com/f"] {
            let mut chain = post_chain(RedirectConfig::default());
            chain.next_request().unwrap();
            let err = chain.on_response(301, &location(bad)).unwrap_err();
            assert!(
                matches!(err, RedirectError::InvalidRedirectTarget { status: 301, .. }),
                "{bad}"
            );
        }
    }

    #[test]
    fn fragment_is_inherited_when_target_has_none() {
        let req: HttpRequest<()> = HttpRequest::get(url("http://localhost/a#section"));
        let mut chain = RedirectChain::new(req, RedirectConfig::default());
        chain.next_request().unwrap();
        chain.on_response(302, &location("/b")).unwrap();
        assert_eq!(chain.current().url.as_str(), "http://localhost/b#section");

        chain.next_request().unwrap();
        chain.on_response(302, &location("/c#other")).unwrap();
        assert_eq!(chain.current().url.as_str(), "http://localhost/c#other");
    }

    #[test]
    fn history_records_each_hop() {
        let mut chain = post_chain(RedirectConfig::default());
        chain.next_request().unwrap();
        chain.on_response(307, &location("/b")).unwrap();
        chain.next_request().unwrap();
        chain.on_response(303, &location("/c")).unwrap();
        let history = chain.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].method, HttpMethod::Post);
        assert!(history[0].body_kept);
        assert_eq!(history[1].from.path(), "/b");
        assert_eq!(history[1].to.path(), "/c");
        assert_eq!(history[1].method, HttpMethod::Get);
        assert!(!history[1].body_kept);
    }
}
