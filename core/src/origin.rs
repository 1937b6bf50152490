//! Origin comparison for credential-sharing decisions.

use url::Url;

/// Two URLs share an origin when scheme, host and effective port (explicit
/// or the scheme's default) all match.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host() == b.host()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Value for a `Host` header addressing `url`: the host, plus the port
/// when it is not the scheme default.
pub fn host_header_value(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
