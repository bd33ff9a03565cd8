//! Keeps asynchronous snapshot renders in arrival order.
//!
//! Decoding a snapshot finishes some time after it was requested. While a
//! decode is pending, later stroke operations are held back and handed out
//! again once the snapshot is on screen. A newer render request supersedes
//! an older one: the older decode is dropped when it completes, together with
//! anything buffered behind it, since the newer snapshot replaces the frame.

use std::cell::{Cell, RefCell};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTicket(u64);

pub struct RenderQueue<T> {
    issued: Cell<u64>,
    pending: RefCell<Option<Vec<T>>>,
}

impl<T> Default for RenderQueue<T> {
    fn default() -> Self {
        Self {
            issued: Cell::new(0),
            pending: RefCell::new(None),
        }
    }
}

impl<T> RenderQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a render and invalidates any earlier ticket.
    pub fn begin(&self) -> RenderTicket {
        let next = self.issued.get() + 1;
        self.issued.set(next);
        *self.pending.borrow_mut() = Some(Vec::new());
        RenderTicket(next)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.issued.get() == ticket.0
    }

    /// Buffers `op` while a render is pending, otherwise hands it back to be
    /// applied immediately.
    pub fn defer(&self, op: T) -> Option<T> {
        match self.pending.borrow_mut().as_mut() {
            Some(buffer) => {
                buffer.push(op);
                None
            }
            None => Some(op),
        }
    }

    /// Completes the render for `ticket`. Returns the operations to replay on
    /// top of the snapshot, or `None` if the ticket was superseded and the
    /// snapshot must not be drawn.
    pub fn finish(&self, ticket: RenderTicket) -> Option<Vec<T>> {
        if !self.is_current(ticket) {
            return None;
        }
        Some(self.pending.borrow_mut().take().unwrap_or_default())
    }
}
