//! In-memory history for environments without an address bar.

use waypost_core::settings::RouterMode;

use super::History;

/// A stack of full paths with a cursor.
///
/// # Examples
///
/// ```
/// use waypost_navigation::history::{History, MemoryHistory};
///
/// let mut history = MemoryHistory::new();
/// history.push("/a");
/// history.push("/b");
/// assert_eq!(history.go(-1).as_deref(), Some("/a"));
/// history.commit_go(-1);
/// assert_eq!(history.current_location(), "/a");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    stack: Vec<String>,
    index: Option<usize>,
}

impl MemoryHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history whose only entry is `full_path`.
    pub fn with_initial(full_path: impl Into<String>) -> Self {
        Self {
            stack: vec![full_path.into()],
            index: Some(0),
        }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.stack
    }

    /// The cursor position.
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    fn target(&self, delta: i64) -> Option<usize> {
        let index = i64::try_from(self.index?).ok()?;
        let target = usize::try_from(index.checked_add(delta)?).ok()?;
        (target < self.stack.len()).then_some(target)
    }
}

impl History for MemoryHistory {
    fn mode(&self) -> RouterMode {
        RouterMode::Abstract
    }

    fn current_location(&self) -> String {
        self.index
            .and_then(|i| self.stack.get(i))
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }

    fn push(&mut self, full_path: &str) {
        let next = self.index.map_or(0, |i| i + 1);
        self.stack.truncate(next);
        self.stack.push(full_path.to_string());
        self.index = Some(next);
    }

    fn replace(&mut self, full_path: &str) {
        match self.index {
            Some(i) => {
                self.stack.truncate(i + 1);
                self.stack[i] = full_path.to_string();
            }
            None => self.push(full_path),
        }
    }

    fn go(&mut self, delta: i64) -> Option<String> {
        let target = self.target(delta)?;
        self.stack.get(target).cloned()
    }

    fn commit_go(&mut self, delta: i64) {
        if let Some(target) = self.target(delta) {
            self.index = Some(target);
        }
    }

    fn ensure_url(&mut self, _full_path: &str, _push: bool) {}

    fn create_href(&self, full_path: &str) -> String {
        full_path.to_string()
    }
}
