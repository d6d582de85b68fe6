use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// Submitted command lines plus a recall cursor.
///
/// The cursor lives in `[0, len]`; `len` means "the fresh empty line past
/// the newest entry". Once `cap` is reached the oldest entry is evicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHistory {
    cap: usize,
    cursor: usize,
    buf: VecDeque<String>,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl CommandHistory {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            cursor: 0,
            buf: VecDeque::with_capacity(cap.min(64)),
        }
    }

    pub fn record(&mut self, command: impl Into<String>) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(command.into());
        self.cursor = self.buf.len();
    }

    /// Moves one entry back. `None` means the cursor was already at the
    /// oldest entry and the caller should keep its input as-is.
    pub fn recall_previous(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.buf.get(self.cursor).map(String::as_str)
    }

    /// Moves one entry forward, yielding `""` on reaching the fresh line.
    pub fn recall_next(&mut self) -> Option<&str> {
        if self.cursor >= self.buf.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.buf.get(self.cursor).map(String::as_str).unwrap_or(""))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.buf.iter().map(String::as_str)
    }
}
