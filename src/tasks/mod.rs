// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Tasks
//!
//! Each task is a queue it alone reads plus a handler for the messages on it. The superloop calls
//! [`Task::run_once`] on every task in priority order; nothing here blocks.
//!
//! | Module | Queue carries |
//! | ------ | ------------- |
//! | [`move_group`] | Move staging, group execute and clear |
//! | [`motion_controller`] | Staged moves and motor requests |
//! | [`motor_driver`] | Driver register and current requests |
//! | [`move_status`] | Completion acks from the pulse generator |

pub mod motion_controller;
pub mod motor_driver;
pub mod move_group;
pub mod move_status;

use crate::queue::{MessageHandler, MessageQueue, TaskQueue};

/// Depth of every task queue.
pub const TASK_QUEUE_DEPTH: usize = 10;

/// A task queue bound to its handler.
pub struct Task<'a, M, H, const N: usize> {
    queue: &'a TaskQueue<M, N>,
    handler: H,
}

impl<'a, M, H, const N: usize> Task<'a, M, H, N>
where
    H: MessageHandler<M>,
{
    pub fn new(queue: &'a TaskQueue<M, N>, handler: H) -> Self {
        Self { queue, handler }
    }

    /// Handle at most one message. Returns `true` if one was waiting.
    pub fn run_once(&mut self) -> bool {
        match self.queue.try_read() {
            Some(message) => {
                self.handler.handle_message(message);
                true
            }
            None => false,
        }
    }

    /// Like [`run_once`](Self::run_once), but polls the queue up to `max_polls` times first.
    pub fn run_with_timeout(&mut self, max_polls: u32) -> bool {
        match self.queue.read_with_timeout(max_polls) {
            Some(message) => {
                self.handler.handle_message(message);
                true
            }
            None => false,
        }
    }

    pub fn queue(&self) -> &'a TaskQueue<M, N> {
        self.queue
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sum(u32);

    impl MessageHandler<u32> for Sum {
        fn handle_message(&mut self, message: u32) {
            self.0 += message;
        }
    }

    #[test]
    fn runs_one_message_per_call() {
        let queue: TaskQueue<u32, 4> = TaskQueue::new();
        let mut task = Task::new(&queue, Sum::default());
        assert!(!task.run_once());

        queue.try_write(2).unwrap();
        queue.try_write(3).unwrap();
        assert!(task.run_once());
        assert_eq!(task.handler().0, 2);
        assert!(task.run_with_timeout(5));
        assert_eq!(task.handler().0, 5);
        assert!(!task.run_with_timeout(5));
    }
}
