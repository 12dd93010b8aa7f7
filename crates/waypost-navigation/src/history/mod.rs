//! History backends.
//!
//! The router records committed routes in a [`History`]. Three backends are
//! provided and are interchangeable from the router's point of view:
//!
//! - [`MemoryHistory`] keeps an in-memory stack and needs no address bar.
//! - [`BrowserHistory`] writes push-state URLs below a base path.
//! - [`HashHistory`] keeps the route in the URL fragment (`#/path`).
//!
//! The address-bar backends talk to the host environment through the
//! [`AddressBar`] trait.

pub mod browser;
pub mod hash;
pub mod memory;

pub use browser::BrowserHistory;
pub use hash::HashHistory;
pub use memory::MemoryHistory;

use percent_encoding::percent_decode_str;
use waypost_core::settings::RouterMode;
use waypost_routing::location::clean_path;

/// Where the router records committed routes.
///
/// All paths passed in and out are router full paths (`/path?query#hash`),
/// without the base.
pub trait History: Send + Sync {
    /// The mode this backend implements.
    fn mode(&self) -> RouterMode;

    /// The full path the history currently points at.
    fn current_location(&self) -> String;

    /// Records a new entry.
    fn push(&mut self, full_path: &str);

    /// Overwrites the current entry.
    fn replace(&mut self, full_path: &str);

    /// Moves `delta` entries through the history.
    ///
    /// Backends that know their entries return the target's full path; the
    /// router then navigates there and calls [`commit_go`](Self::commit_go)
    /// once the navigation commits. Address-bar backends forward the move to
    /// the host and return `None`; the host reports the resulting location
    /// change back to the router.
    fn go(&mut self, delta: i64) -> Option<String>;

    /// Completes a move started by [`go`](Self::go).
    fn commit_go(&mut self, _delta: i64) {}

    /// Makes the recorded location match `full_path`, pushing a new entry if
    /// `push` is set and replacing the current one otherwise. Does nothing
    /// if they already match.
    fn ensure_url(&mut self, full_path: &str, push: bool);

    /// The link target for `full_path`.
    fn create_href(&self, full_path: &str) -> String;
}

/// The host's address bar.
///
/// Implemented by the embedding environment. URLs passed to
/// [`push_state`](Self::push_state) and
/// [`replace_state`](Self::replace_state) are absolute paths or full URLs.
pub trait AddressBar: Send + Sync {
    /// The full URL currently shown, e.g. `https://example.com/app/a?b#c`.
    fn href(&self) -> String;

    /// Adds a history entry for `url`.
    fn push_state(&self, url: &str);

    /// Replaces the current history entry with `url`.
    fn replace_state(&self, url: &str);

    /// Moves through the host's history.
    fn go(&self, delta: i64);

    /// Whether the host supports push-state URLs.
    fn supports_push_state(&self) -> bool {
        true
    }
}

/// Brings a configured base into the form `/segment`, without trailing slash.
///
/// The root base `/` normalizes to the empty string.
pub fn normalize_base(base: &str) -> String {
    let base = base.trim();
    let mut normalized = if base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    };
    while normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Joins a normalized base and a full path.
pub(crate) fn join_base(base: &str, full_path: &str) -> String {
    clean_path(&format!("{base}/{full_path}"))
}

/// Percent-decodes `path`, leaving escapes of reserved characters intact.
pub(crate) fn decode_uri(path: &str) -> String {
    const RESERVED: &[u8] = b";/?:@&=+$,#";

    let decode = |part: &str| percent_decode_str(part).decode_utf8_lossy().into_owned();
    let bytes = path.as_bytes();
    let mut decoded = String::with_capacity(path.len());
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| path.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(byte) if RESERVED.contains(&byte) => {
                decoded.push_str(&decode(&path[start..i]));
                decoded.push_str(&path[i..i + 3]);
                i += 3;
                start = i;
            }
            _ => i += 1,
        }
    }
    decoded.push_str(&decode(&path[start..]));
    decoded
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("/"), "");
        assert_eq!(normalize_base(""), "");
        assert_eq!(normalize_base("app"), "/app");
        assert_eq!(normalize_base("/app/"), "/app");
    }

    #[test]
    fn test_decode_uri_keeps_reserved_escapes() {
        assert_eq!(decode_uri("/caf%C3%A9"), "/café");
        assert_eq!(decode_uri("/a%20b/c%2Fd"), "/a b/c%2Fd");
        assert_eq!(decode_uri("/100%"), "/100%");
    }

    #[test]
    fn test_join_base() {
        assert_eq!(join_base("/app", "/users?x=1"), "/app/users?x=1");
        assert_eq!(join_base("", "/users"), "/users");
    }
}
