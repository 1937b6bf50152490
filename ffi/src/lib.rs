//! C-ABI wrapper around `redirect-core`.
//!
//! # Overview
//! Exposes the sans-IO redirect chain through `extern "C"` functions so a
//! host with its own HTTP stack can follow redirects with the same rules as
//! Rust callers. The host performs every hop; the library only says what the
//! next hop looks like.
//!
//! ```text
//! chain = redirect_chain_new(...)
//! loop {
//!     req  = redirect_chain_next_request(chain)   // perform it
//!     step = redirect_chain_on_response(chain, &resp)
//!     Terminal -> done, Follow -> drain and loop, anything else -> error
//! }
//! ```
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - The C caller owns all returned pointers and must call the matching
//!   `redirect_free_*` / `redirect_chain_free` function to release them.

pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use redirect_core::{Decision, HttpMethod, HttpRequest, RedirectChain, RedirectConfig, Url};

use types::*;

// ---------------------------------------------------------------------------
// Chain lifecycle
// ---------------------------------------------------------------------------

/// Start a chain for the request `method url` with the given headers.
///
/// `has_body` says whether the host will send a body; the host keeps the body
/// itself. `max_hops` of 0 means no redirects are followed at all.
/// Returns null if `method` or `url` is null or invalid, if a header is not
/// valid UTF-8, or if an internal panic occurs. Free with
/// `redirect_chain_free`.
#[unsafe(no_mangle)]
pub extern "C" fn redirect_chain_new(
    method: *const c_char,
    url: *const c_char,
    headers: *const FfiHeaderRef,
    headers_len: u32,
    has_body: bool,
    max_hops: u32,
) -> *mut FfiRedirectChain {
    catch_unwind(|| {
        let config = RedirectConfig::default().with_max_hops(max_hops as usize);
        build_chain(method, url, headers, headers_len, has_body, config)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Like `redirect_chain_new`, with the hop bound and credential header list
/// taken from a JSON `RedirectConfig`, e.g.
/// `{"max_hops": 5, "sensitive_headers": ["authorization", "x-api-key"]}`.
///
/// Missing fields keep their defaults; a null `config_json` is the default
/// config. Returns null on invalid JSON or an invalid header name.
#[unsafe(no_mangle)]
pub extern "C" fn redirect_chain_new_with_config_json(
    method: *const c_char,
    url: *const c_char,
    headers: *const FfiHeaderRef,
    headers_len: u32,
    has_body: bool,
    config_json: *const c_char,
) -> *mut FfiRedirectChain {
    catch_unwind(|| {
        let config = if config_json.is_null() {
            RedirectConfig::default()
        } else {
            match str_from_ffi(config_json).map(RedirectConfig::from_json) {
                Some(Ok(config)) => config,
                _ => return std::ptr::null_mut(),
            }
        };
        build_chain(method, url, headers, headers_len, has_body, config)
    })
    .unwrap_or(std::ptr::null_mut())
}

fn build_chain(
    method: *const c_char,
    url: *const c_char,
    headers: *const FfiHeaderRef,
    headers_len: u32,
    has_body: bool,
    config: RedirectConfig,
) -> *mut FfiRedirectChain {
    let Some(method) = str_from_ffi(method).and_then(|m| m.parse::<HttpMethod>().ok()) else {
        return std::ptr::null_mut();
    };
    let Some(url) = str_from_ffi(url).and_then(|u| Url::parse(u).ok()) else {
        return std::ptr::null_mut();
    };
    let Some(headers) = headers_from_ffi(headers, headers_len) else {
        return std::ptr::null_mut();
    };

    let mut req = HttpRequest::new(method, url).with_headers(headers);
    if has_body {
        req = req.with_body(());
    }
    Box::into_raw(Box::new(FfiRedirectChain {
        inner: RedirectChain::new(req, config),
    }))
}

/// Free a chain created by `redirect_chain_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn redirect_chain_free(chain: *mut FfiRedirectChain) {
    if !chain.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(chain) });
        });
    }
}

/// Redirects followed so far, saturating at `u32::MAX`. 0 for a null chain.
#[unsafe(no_mangle)]
pub extern "C" fn redirect_chain_hops_taken(chain: *const FfiRedirectChain) -> u32 {
    if chain.is_null() {
        return 0;
    }
    let chain = unsafe { &*chain };
    catch_unwind(AssertUnwindSafe(|| saturating_u32(chain.inner.hops_taken()))).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Driving the chain
// ---------------------------------------------------------------------------

/// The request to perform for the current hop.
///
/// Returns null if `chain` is null or if the chain is not waiting to issue a
/// request (a response is still pending, or the chain has finished).
/// Free with `redirect_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn redirect_chain_next_request(chain: *mut FfiRedirectChain) -> *mut FfiHttpRequest {
    if chain.is_null() {
        return std::ptr::null_mut();
    }
    let chain = unsafe { &mut *chain };
    catch_unwind(AssertUnwindSafe(|| match chain.inner.next_request() {
        Ok(req) => FfiHttpRequest::from_core(req),
        Err(_) => std::ptr::null_mut(),
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Report the status and headers of the response to the last request.
///
/// Never returns null. Free with `redirect_free_step`.
#[unsafe(no_mangle)]
pub extern "C" fn redirect_chain_on_response(
    chain: *mut FfiRedirectChain,
    response: *const FfiHttpResponse,
) -> *mut FfiStep {
    if chain.is_null() {
        return FfiStep::error(FfiStepTag::NullArg, 0, "null argument: chain");
    }
    if response.is_null() {
        return FfiStep::error(FfiStepTag::NullArg, 0, "null argument: response");
    }
    let chain = unsafe { &mut *chain };
    let response = unsafe { &*response };
    catch_unwind(AssertUnwindSafe(|| {
        let hops = chain.inner.hops_taken();
        let Some(headers) = headers_from_ffi(response.headers, response.headers_len) else {
            return FfiStep::error(FfiStepTag::InvalidArg, hops, "invalid response header");
        };
        match chain.inner.on_response(response.status, &headers) {
            Ok(Decision::Return) => FfiStep::ok(FfiStepTag::Terminal, chain.inner.hops_taken()),
            Ok(Decision::Follow(_)) => FfiStep::ok(FfiStepTag::Follow, chain.inner.hops_taken()),
            Err(e) => FfiStep::from_error(&e, chain.inner.hops_taken()),
        }
    }))
    .unwrap_or_else(|_| FfiStep::error(FfiStepTag::Panic, 0, "panic in redirect_chain_on_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `redirect_chain_next_request`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn redirect_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        redirect_free_string(req.method);
        redirect_free_string(req.url);
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                redirect_free_string(h.name);
                redirect_free_string(h.value);
            }
        }
    });
}

/// Free an `FfiStep` returned by `redirect_chain_on_response`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn redirect_free_step(step: *mut FfiStep) {
    if step.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let step = unsafe { Box::from_raw(step) };
        redirect_free_string(step.error_message);
    });
}

/// Free a string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn redirect_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}
