//! "Copy Markdown" state: `Idle -> Copied -> Idle` after a fixed delay

use anyhow::Result;
use std::time::{Duration, Instant};

pub const COPY_LABEL: &str = "Copy Markdown";
pub const COPIED_LABEL: &str = "Copied Page!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyState {
    Idle,
    Copied { since: Instant },
}

#[derive(Debug, Clone)]
pub struct CopyButton {
    state: CopyState,
    reset_after: Duration,
}

impl CopyButton {
    pub fn new(reset_after: Duration) -> Self {
        Self {
            state: CopyState::Idle,
            reset_after,
        }
    }

    pub fn state(&self) -> CopyState {
        self.state
    }

    pub fn is_copied(&self) -> bool {
        matches!(self.state, CopyState::Copied { .. })
    }

    pub fn label(&self) -> &'static str {
        if self.is_copied() {
            COPIED_LABEL
        } else {
            COPY_LABEL
        }
    }

    /// Run `write` and enter `Copied`.
    ///
    /// Ignored (returns `Ok(false)`) while already copied. A failed write leaves the state `Idle`.
    pub fn copy(&mut self, now: Instant, write: impl FnOnce() -> Result<()>) -> Result<bool> {
        if self.is_copied() {
            return Ok(false);
        }
        write()?;
        self.state = CopyState::Copied { since: now };
        Ok(true)
    }

    /// Advance the clock; returns true when the state went back to `Idle`
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state {
            CopyState::Copied { since } if now.saturating_duration_since(since) >= self.reset_after => {
                self.state = CopyState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Time left before the reset, if copied
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match self.state {
            CopyState::Copied { since } => {
                Some(self.reset_after.saturating_sub(now.saturating_duration_since(since)))
            }
            CopyState::Idle => None,
        }
    }
}

/// Put text on the system clipboard.
///
/// On some platforms the contents only live as long as the returned handle.
#[cfg(feature = "clipboard")]
pub fn copy_to_clipboard(text: &str) -> Result<arboard::Clipboard> {
    use anyhow::Context;

    let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
    clipboard
        .set_text(text.to_string())
        .context("Failed to write to clipboard")?;
    Ok(clipboard)
}
