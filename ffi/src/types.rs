//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! The host keeps the request body on its own side, so the chain behind the
//! C ABI is a `RedirectChain<()>`: a present `()` body means "send your
//! original body again". Strings cross as NUL-terminated C strings, header
//! lists as pointer plus length. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use redirect_core::{HeaderList, HttpRequest, RedirectChain, RedirectError};

/// Opaque handle to one redirect chain. C callers receive a pointer to this
/// and pass it back into every `redirect_chain_*` function.
pub struct FfiRedirectChain {
    pub(crate) inner: RedirectChain<()>,
}

// ---------------------------------------------------------------------------
// Input types (caller-provided, not freed by us)
// ---------------------------------------------------------------------------

/// A header borrowed from the caller.
#[repr(C)]
pub struct FfiHeaderRef {
    pub name: *const c_char,
    pub value: *const c_char,
}

/// The status and headers of a response the host received.
///
/// The host builds this on the stack; the body never crosses the boundary.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub headers: *const FfiHeaderRef,
    pub headers_len: u32,
}

/// Read a caller-provided header array. `None` on a null entry or invalid
/// UTF-8.
pub(crate) fn headers_from_ffi(headers: *const FfiHeaderRef, len: u32) -> Option<HeaderList> {
    if headers.is_null() || len == 0 {
        return Some(HeaderList::new());
    }
    let refs = unsafe { std::slice::from_raw_parts(headers, len as usize) };
    let mut list = HeaderList::new();
    for h in refs {
        list.append(str_from_ffi(h.name)?, str_from_ffi(h.value)?);
    }
    Some(list)
}

pub(crate) fn str_from_ffi<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Output types (allocated by us, freed by `redirect_free_*`)
// ---------------------------------------------------------------------------

/// A header owned by the library.
#[repr(C)]
pub struct FfiHeader {
    pub name: *mut c_char,
    pub value: *mut c_char,
}

/// The request the host must perform for the current hop.
///
/// When `send_body` is true the host sends the body it started the chain
/// with, unchanged.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: *mut c_char,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub send_body: bool,
}

/// `n` as a C count, clamped instead of wrapping.
pub(crate) fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn c_string(s: &str) -> *mut c_char {
    // Header values coming from a parsed `HeaderList` never hold NUL.
    CString::new(s).unwrap_or_default().into_raw()
}

impl FfiHttpRequest {
    /// Convert a core request into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: &HttpRequest<()>) -> *mut Self {
        let headers_len = saturating_u32(req.headers.len());
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let boxed: Box<[FfiHeader]> = req
                .headers
                .iter()
                .map(|(n, v)| FfiHeader {
                    name: c_string(n),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(boxed) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: c_string(req.method.as_str()),
            url: c_string(req.url.as_str()),
            headers,
            headers_len,
            send_body: req.body.is_some(),
        }))
    }
}

/// What `redirect_chain_on_response` decided.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiStepTag {
    /// Not a redirect: the response is the final one.
    Terminal = 0,
    /// Discard the response and call `redirect_chain_next_request`.
    Follow = 1,
    TooManyRedirects = 2,
    InvalidRedirectTarget = 3,
    UnexpectedState = 4,
    NullArg = 5,
    InvalidArg = 6,
    Panic = 7,
}

/// Outcome of one response. `error_message` is null unless the tag is an
/// error.
#[repr(C)]
pub struct FfiStep {
    pub tag: FfiStepTag,
    pub hops_taken: u32,
    pub error_message: *mut c_char,
}

impl FfiStep {
    pub(crate) fn ok(tag: FfiStepTag, hops_taken: usize) -> *mut Self {
        Box::into_raw(Box::new(FfiStep {
            tag,
            hops_taken: saturating_u32(hops_taken),
            error_message: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn error(tag: FfiStepTag, hops_taken: usize, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiStep {
            tag,
            hops_taken: saturating_u32(hops_taken),
            error_message: c_string(msg),
        }))
    }

    pub(crate) fn from_error(err: &RedirectError, hops_taken: usize) -> *mut Self {
        let tag = match err {
            RedirectError::TooManyRedirects { .. } => FfiStepTag::TooManyRedirects,
            RedirectError::InvalidRedirectTarget { .. } => FfiStepTag::InvalidRedirectTarget,
            RedirectError::UnexpectedState { .. } => FfiStepTag::UnexpectedState,
        };
        Self::error(tag, hops_taken, &err.to_string())
    }
}
