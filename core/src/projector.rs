//! Header set for the next hop of a redirect.

use tracing::trace;
use url::Url;

use crate::config::RedirectConfig;
use crate::headers::HeaderList;
use crate::origin::host_header_value;

/// Headers that describe a request body. They go when the body goes.
pub const BODY_HEADERS: &[&str] = &[
    "content-length",
    "content-type",
    "transfer-encoding",
    "content-encoding",
];

/// Derive the next hop's headers from the previous hop's.
///
/// Body-framing headers are removed when `body_dropped`, the configured
/// credential headers are removed when `cross_origin`, and an explicit `Host`
/// is rewritten for `target`. Everything else is kept in order.
pub fn project(
    previous: &HeaderList,
    body_dropped: bool,
    cross_origin: bool,
    target: &Url,
    config: &RedirectConfig,
) -> HeaderList {
    let mut next = HeaderList::new();
    for (name, value) in previous.iter() {
        if body_dropped && is_body_header(name) {
            trace!(header = name, "dropping body header");
            continue;
        }
        if cross_origin && config.is_sensitive(name) {
            trace!(header = name, "stripping credential header on cross-origin hop");
            continue;
        }
        next.append(name, value);
    }
    if next.contains("host") {
        match host_header_value(target) {
            Some(host) => next.set("host", host),
            None => {
                next.remove("host");
            }
        }
    }
    next
}

fn is_body_header(name: &str) -> bool {
    BODY_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}
