use std::sync::{Mutex, PoisonError};

/// How a navigation affects history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// Adds a history entry
    Push,
    /// Rewrites the current entry in place
    Replace,
}

/// Where services send the user when a page or action needs it
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str, mode: NavigationMode);
}

/// In-memory history stack
///
/// Replace rewrites the top entry; push adds one. Every call is also recorded
/// so callers can see exactly what was requested.
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<String>>,
    navigations: Mutex<Vec<(String, NavigationMode)>>,
}

impl History {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(vec![initial.into()]),
            navigations: Mutex::new(Vec::new()),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn navigations(&self) -> Vec<(String, NavigationMode)> {
        self.navigations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for History {
    fn navigate(&self, target: &str, mode: NavigationMode) {
        tracing::debug!(target = %target, mode = ?mode, "Navigating");

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match mode {
            NavigationMode::Push => entries.push(target.to_string()),
            NavigationMode::Replace => match entries.last_mut() {
                Some(top) => *top = target.to_string(),
                None => entries.push(target.to_string()),
            },
        }
        drop(entries);

        self.navigations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((target.to_string(), mode));
    }
}
