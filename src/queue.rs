// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Bounded task message queues.
//!
//! Every task owns one [`TaskQueue`] and is its only reader. Any number of producers (dispatch
//! targets, other tasks) share it by reference. Writes never block: a full queue hands the
//! message back in [`QueueFull`] and the producer decides how to report the drop.
//!
//! The interrupt path does not use these queues. It talks to tasks through lock-free
//! `heapless::spsc` queues instead.

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::Mutex;
use heapless::Deque;

/// A write was refused because the queue is at capacity. Carries the rejected message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull<T>(pub T);

/// Queue interface the fabric is written against.
pub trait MessageQueue<T> {
    /// Append without blocking.
    fn try_write(&self, message: T) -> Result<(), QueueFull<T>>;

    /// Pop the oldest message, if any.
    fn try_read(&self) -> Option<T>;

    fn has_message(&self) -> bool;

    /// `nb` flavored read: `WouldBlock` while empty.
    fn read(&self) -> nb::Result<T, Infallible> {
        self.try_read().ok_or(nb::Error::WouldBlock)
    }

    /// Poll up to `max_polls` times for a message.
    fn read_with_timeout(&self, max_polls: u32) -> Option<T> {
        for _ in 0..max_polls {
            match self.read() {
                Ok(message) => return Some(message),
                Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
                Err(nb::Error::Other(e)) => match e {},
            }
        }
        None
    }
}

/// Bounded FIFO guarded by a critical section. Safe to share between the main loop and
/// interrupt handlers.
pub struct TaskQueue<T, const N: usize> {
    inner: Mutex<RefCell<Deque<T, N>>>,
}

impl<T, const N: usize> TaskQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop everything queued.
    pub fn clear(&self) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).clear());
    }
}

impl<T, const N: usize> Default for TaskQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> MessageQueue<T> for TaskQueue<T, N> {
    fn try_write(&self, message: T) -> Result<(), QueueFull<T>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).push_back(message))
            .map_err(QueueFull)
    }

    fn try_read(&self) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop_front())
    }

    fn has_message(&self) -> bool {
        !self.is_empty()
    }
}

/// Per-task message handler, called once per dequeued message.
pub trait MessageHandler<M> {
    fn handle_message(&mut self, message: M);
}
