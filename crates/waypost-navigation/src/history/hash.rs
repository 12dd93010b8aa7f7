//! Fragment-based history.

use std::fmt;
use std::sync::Arc;

use url::Url;
use waypost_core::settings::RouterMode;

use super::browser::location_of;
use super::{decode_uri, join_base, normalize_base, AddressBar, History};

/// History that keeps the route in the URL fragment, e.g. `/app/#/users`.
pub struct HashHistory {
    bar: Arc<dyn AddressBar>,
    base: String,
}

impl fmt::Debug for HashHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashHistory")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl HashHistory {
    /// Creates a hash history over `bar`.
    ///
    /// With `fallback` set, a plain push-state URL such as `/app/users` is
    /// first rewritten into its fragment form `/app/#/users`. The fragment is
    /// then made to start with `/`.
    pub fn new(bar: Arc<dyn AddressBar>, base: &str, fallback: bool) -> Self {
        let history = Self {
            bar,
            base: normalize_base(base),
        };
        if fallback {
            history.rewrite_from_path();
        }
        history.ensure_slash();
        history
    }

    fn rewrite_from_path(&self) {
        let location = location_of(&self.bar.href(), &self.base);
        if !location.starts_with("/#") {
            self.bar
                .replace_state(&join_base(&self.base, &format!("/#{location}")));
        }
    }

    fn ensure_slash(&self) {
        let path = self.fragment();
        if !path.starts_with('/') {
            self.bar.replace_state(&self.url_for(&format!("/{path}")));
        }
    }

    /// The decoded route part of the fragment.
    fn fragment(&self) -> String {
        let href = self.bar.href();
        let Some(index) = href.find('#') else {
            return String::new();
        };
        let fragment = &href[index + 1..];
        match fragment.find(|c: char| c == '?' || c == '#') {
            Some(split) => format!("{}{}", decode_uri(&fragment[..split]), &fragment[split..]),
            None => decode_uri(fragment),
        }
    }

    /// The current URL with its fragment replaced by `path`.
    fn url_for(&self, path: &str) -> String {
        match Url::parse(&self.bar.href()) {
            Ok(mut url) => {
                url.set_fragment(Some(path));
                url.to_string()
            }
            Err(_) => format!("#{path}"),
        }
    }
}

impl History for HashHistory {
    fn mode(&self) -> RouterMode {
        RouterMode::Hash
    }

    fn current_location(&self) -> String {
        self.fragment()
    }

    fn push(&mut self, full_path: &str) {
        self.bar.push_state(&self.url_for(full_path));
    }

    fn replace(&mut self, full_path: &str) {
        self.bar.replace_state(&self.url_for(full_path));
    }

    fn go(&mut self, delta: i64) -> Option<String> {
        self.bar.go(delta);
        None
    }

    fn ensure_url(&mut self, full_path: &str, push: bool) {
        if self.fragment() == full_path {
            return;
        }
        if push {
            self.push(full_path);
        } else {
            self.replace(full_path);
        }
    }

    fn create_href(&self, full_path: &str) -> String {
        if self.base.is_empty() {
            format!("#{full_path}")
        } else {
            join_base(&self.base, &format!("#{full_path}"))
        }
    }
}
