//! Which statuses redirect, and what the next hop sends.
//!
//! 301, 302 and 303 are the legacy codes: clients historically rewrite an
//! unsafe method to GET and drop its body. 307 and 308 exist to forbid that
//! rewrite, so method and body go through untouched.

use crate::http::HttpMethod;

/// What happens to the request body on the next hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyDisposition {
    /// Hand the original producer to the next hop.
    Preserve,
    /// Send the next hop without a body.
    Drop,
}

/// The next hop's method and body handling for a redirect status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectAction {
    pub status: u16,
    pub method: HttpMethod,
    pub body: BodyDisposition,
}

impl RedirectAction {
    pub fn drops_body(&self) -> bool {
        self.body == BodyDisposition::Drop
    }
}

/// Decide whether `status` redirects a request sent with `method`.
///
/// Returns `None` for every status that is not followed, including the
/// other 3xx codes (300, 304, 305, 306).
pub fn decide(status: u16, method: &HttpMethod) -> Option<RedirectAction> {
    match status {
        301 | 302 | 303 if method.is_retrieval() => Some(RedirectAction {
            status,
            method: method.clone(),
            body: BodyDisposition::Preserve,
        }),
        301 | 302 | 303 => Some(RedirectAction {
            status,
            method: HttpMethod::Get,
            body: BodyDisposition::Drop,
        }),
        307 | 308 => Some(RedirectAction {
            status,
            method: method.clone(),
            body: BodyDisposition::Preserve,
        }),
        _ => None,
    }
}
