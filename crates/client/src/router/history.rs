//! Navigable location history.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Session history the router keeps in sync with the rendered page.
pub trait History: Send + Sync {
    /// Current location path.
    fn location(&self) -> String;

    /// Push a new entry, making it the current location.
    fn push(&self, path: &str);
}

#[derive(Debug)]
struct Entries {
    stack: Vec<String>,
    index: usize,
}

/// In-memory history with back/forward traversal.
///
/// Pushing discards any forward entries, like a browser does.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Entries>,
}

impl MemoryHistory {
    pub fn new(initial: &str) -> Self {
        Self { entries: Mutex::new(Entries { stack: vec![initial.to_string()], index: 0 }) }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Step back one entry. Returns the new location, or `None` at the start.
    pub fn back(&self) -> Option<String> {
        let mut entries = self.lock();
        if entries.index == 0 {
            return None;
        }
        entries.index -= 1;
        Some(entries.stack[entries.index].clone())
    }

    /// Step forward one entry. Returns the new location, or `None` at the end.
    pub fn forward(&self) -> Option<String> {
        let mut entries = self.lock();
        if entries.index + 1 >= entries.stack.len() {
            return None;
        }
        entries.index += 1;
        Some(entries.stack[entries.index].clone())
    }

    /// Number of entries, including forward ones.
    pub fn len(&self) -> usize {
        self.lock().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().stack.is_empty()
    }
}

impl History for MemoryHistory {
    fn location(&self) -> String {
        let entries = self.lock();
        entries.stack[entries.index].clone()
    }

    fn push(&self, path: &str) {
        let mut entries = self.lock();
        let keep = entries.index + 1;
        entries.stack.truncate(keep);
        entries.stack.push(path.to_string());
        entries.index = keep;
    }
}
