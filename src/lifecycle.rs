//! Lifecycle state shared by backends, databases and tables
//!
//! ```text
//!   created ──open()──▶ opened ──close()──▶ closed
//!      │                                      ▲
//!      └──────────────close()─────────────────┘
//! ```
//!
//! `opened` and `closed` are tracked separately: an entity that was never
//! opened can still be closed, and a closed entity never opens again.

use crate::error::{ColKvError, Result};

#[derive(Debug)]
pub(crate) struct Lifecycle {
    entity: &'static str,
    name: String,
    opened: bool,
    closed: bool,
}

impl Lifecycle {
    pub(crate) fn new(entity: &'static str, name: impl Into<String>) -> Self {
        Self {
            entity,
            name: name.into(),
            opened: false,
            closed: false,
        }
    }

    /// Fail with `Closed` once the entity has been closed
    pub(crate) fn check(&self) -> Result<()> {
        if self.closed {
            return Err(ColKvError::closed(self.entity, self.name.clone()));
        }
        Ok(())
    }

    /// Run `open` exactly once, on first use
    ///
    /// The entity stays unopened if `open` fails, so the next call retries.
    pub(crate) fn ensure_open<F>(&mut self, open: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        self.check()?;
        if !self.opened {
            open()?;
            self.opened = true;
            tracing::debug!(entity = self.entity, name = %self.name, "opened");
        }
        Ok(())
    }

    /// Mark closed; returns whether the entity had been opened and therefore
    /// needs its resources released. `None` when already closed.
    pub(crate) fn begin_close(&mut self) -> Option<bool> {
        if self.closed {
            return None;
        }
        self.closed = true;
        tracing::debug!(entity = self.entity, name = %self.name, "closed");
        Some(self.opened)
    }

    pub(crate) fn is_opened(&self) -> bool {
        self.opened
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}
