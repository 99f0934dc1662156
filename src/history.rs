use crate::page::PageState;
use std::sync::Arc;

/// Pages the browser navigated away from, most recent last.
#[derive(Debug, Default)]
pub struct History {
    states: Vec<Arc<PageState>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a superseded page.
    pub fn push(&mut self, state: Arc<PageState>) {
        self.states.push(state);
    }

    /// Removes and returns the most recently pushed page.
    pub fn pop(&mut self) -> Option<Arc<PageState>> {
        self.states.pop()
    }

    /// The most recently pushed page, left in place.
    pub fn top(&self) -> Option<&Arc<PageState>> {
        self.states.last()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
