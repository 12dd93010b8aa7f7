//! Push-state history below a base path.

use std::fmt;
use std::sync::Arc;

use url::Url;
use waypost_core::settings::RouterMode;

use super::{decode_uri, join_base, normalize_base, AddressBar, History};

/// History that writes `base + full path` URLs through push-state.
pub struct BrowserHistory {
    bar: Arc<dyn AddressBar>,
    base: String,
}

impl fmt::Debug for BrowserHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserHistory")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl BrowserHistory {
    /// Creates a history over `bar` serving routes below `base`.
    pub fn new(bar: Arc<dyn AddressBar>, base: &str) -> Self {
        Self {
            bar,
            base: normalize_base(base),
        }
    }

    /// The normalized base.
    pub fn base(&self) -> &str {
        &self.base
    }
}

/// Extracts the router full path from an address-bar URL.
///
/// The base is stripped case-insensitively from the decoded path; query and
/// fragment are kept as they are.
pub fn location_of(href: &str, base: &str) -> String {
    let Ok(url) = Url::parse(href) else {
        tracing::warn!(href, "address bar reported an unparsable URL");
        return "/".to_string();
    };

    let mut path = decode_uri(url.path());
    if !base.is_empty()
        && path
            .get(..base.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(base))
        && path[base.len()..].chars().next().map_or(true, |c| c == '/')
    {
        path.replace_range(..base.len(), "");
    }
    if path.is_empty() {
        path.push('/');
    }
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        path.push('#');
        path.push_str(fragment);
    }
    path
}

impl History for BrowserHistory {
    fn mode(&self) -> RouterMode {
        RouterMode::History
    }

    fn current_location(&self) -> String {
        location_of(&self.bar.href(), &self.base)
    }

    fn push(&mut self, full_path: &str) {
        self.bar.push_state(&join_base(&self.base, full_path));
    }

    fn replace(&mut self, full_path: &str) {
        self.bar.replace_state(&join_base(&self.base, full_path));
    }

    fn go(&mut self, delta: i64) -> Option<String> {
        self.bar.go(delta);
        None
    }

    fn ensure_url(&mut self, full_path: &str, push: bool) {
        if self.current_location() == full_path {
            return;
        }
        if push {
            self.push(full_path);
        } else {
            self.replace(full_path);
        }
    }

    fn create_href(&self, full_path: &str) -> String {
        join_base(&self.base, full_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::testing::FakeAddressBar;

    #[test]
    fn test_location_strips_base() {
        assert_eq!(
            location_of("https://example.com/app/users?x=1#top", "/app"),
            "/users?x=1#top"
        );
        assert_eq!(location_of("https://example.com/APP", "/app"), "/");
        assert_eq!(location_of("https://example.com/other", "/app"), "/other");
        assert_eq!(location_of("https://example.com/apple", "/app"), "/apple");
        assert_eq!(location_of("https://example.com/caf%C3%A9", ""), "/café");
    }

    #[test]
    fn test_push_and_replace_prepend_base() {
        let bar = Arc::new(FakeAddressBar::new("https://example.com/app/"));
        let mut history = BrowserHistory::new(bar.clone(), "/app/");
        assert_eq!(history.base(), "/app");
        assert_eq!(history.current_location(), "/");

        history.push("/users?page=2");
        assert_eq!(bar.href(), "https://example.com/app/users?page=2");
        assert_eq!(history.current_location(), "/users?page=2");

        history.replace("/settings");
        assert_eq!(bar.len(), 2);
        assert_eq!(history.current_location(), "/settings");
        assert_eq!(history.create_href("/a#b"), "/app/a#b");
    }

    #[test]
    fn test_ensure_url_only_writes_on_mismatch() {
        let bar = Arc::new(FakeAddressBar::new("https://example.com/a"));
        let mut history = BrowserHistory::new(bar.clone(), "/");

        history.ensure_url("/a", true);
        assert_eq!(bar.len(), 1);

        history.ensure_url("/b", false);
        assert_eq!(bar.len(), 1);
        assert_eq!(history.current_location(), "/b");

        history.ensure_url("/c", true);
        assert_eq!(bar.len(), 2);
    }

    #[test]
    fn test_go_is_forwarded() {
        let bar = Arc::new(FakeAddressBar::new("https://example.com/a"));
        let mut history = BrowserHistory::new(bar.clone(), "/");
        history.push("/b");
        assert_eq!(history.go(-1), None);
        assert_eq!(history.current_location(), "/a");
    }
}
