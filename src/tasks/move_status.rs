// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Move status reporter.
//!
//! The pulse generator cannot log or write to a task queue. It leaves acks on an spsc queue and
//! raises flags in [`PositionStatus`]; this task turns both into frames for the host.

use heapless::spsc::Consumer;

use crate::can::messages::{ErrorMessage, MoveCompleted};
use crate::can::writer::MessageWriter;
use crate::can::{ErrorCode, ErrorSeverity, NodeId};
use crate::logging::{error, trace, warn};
use crate::motion::moves::Ack;
use crate::motion::position::{PositionFlags, PositionStatus};

pub struct MoveStatusReporterTask<'a, const A: usize, const W: usize> {
    acks: Consumer<'a, Ack, A>,
    status: &'a PositionStatus,
    writer: MessageWriter<'a, W>,
    host: NodeId,
    overflow_reported: bool,
}

impl<'a, const A: usize, const W: usize> MoveStatusReporterTask<'a, A, W> {
    pub fn new(
        acks: Consumer<'a, Ack, A>,
        status: &'a PositionStatus,
        writer: MessageWriter<'a, W>,
        host: NodeId,
    ) -> Self {
        Self {
            acks,
            status,
            writer,
            host,
            overflow_reported: false,
        }
    }

    /// Report new status flags, then forward at most one ack. Returns `true` if anything was
    /// sent.
    pub fn run_once(&mut self) -> bool {
        let mut sent = self.report_flags();
        if let Some(ack) = self.acks.dequeue() {
            trace!("ack {}/{}: {:?}", ack.group_id, ack.seq_id, ack.ack_id);
            self.writer.send_can_message(
                self.host,
                MoveCompleted {
                    group_id: ack.group_id,
                    seq_id: ack.seq_id,
                    current_position: ack.current_position,
                    encoder_position: ack.encoder_position,
                    ack_id: ack.ack_id as u8,
                },
            );
            sent = true;
        }
        sent
    }

    fn report_flags(&mut self) -> bool {
        let flags = self.status.flags();
        let mut sent = false;

        // Overflow stays set until the axis is cancelled; report it once per occurrence.
        let overflow = flags.contains(PositionFlags::POSITION_OVERFLOW);
        if overflow && !self.overflow_reported {
            error!("position overflow, axis halted");
            self.writer.send_can_message(
                self.host,
                ErrorMessage::new(ErrorSeverity::Unrecoverable, ErrorCode::Hardware),
            );
            sent = true;
        }
        self.overflow_reported = overflow;

        if flags.contains(PositionFlags::NOTIFICATION_DROPPED) {
            warn!("move ack queue overflowed, completions lost");
            self.status.clear_flags(PositionFlags::NOTIFICATION_DROPPED);
            self.writer.send_can_message(
                self.host,
                ErrorMessage::new(ErrorSeverity::Warning, ErrorCode::Hardware),
            );
            sent = true;
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::can::writer::{CanWriterQueue, OutgoingMessage};
    use crate::motion::moves::AckMessageId;
    use crate::queue::{MessageQueue, TaskQueue};
    use heapless::spsc::Queue;

    #[test]
    fn acks_become_move_completed() {
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let out: CanWriterQueue<4> = TaskQueue::new();
        let (mut tx, rx) = acks.split();
        let mut task = MoveStatusReporterTask::new(rx, &status, MessageWriter::new(&out), NodeId::Host);

        assert!(!task.run_once());
        tx.enqueue(Ack {
            group_id: 1,
            seq_id: 4,
            current_position: 300,
            encoder_position: 12,
            position_flags: 0,
            ack_id: AckMessageId::StoppedByCondition,
        })
        .unwrap();
        assert!(task.run_once());

        let frame = out.try_read().unwrap();
        assert_eq!(
            frame.message,
            OutgoingMessage::MoveCompleted(MoveCompleted {
                group_id: 1,
                seq_id: 4,
                current_position: 300,
                encoder_position: 12,
                ack_id: 2,
            })
        );
    }

    #[test]
    fn overflow_reported_once() {
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let out: CanWriterQueue<4> = TaskQueue::new();
        let (_tx, rx) = acks.split();
        let mut task = MoveStatusReporterTask::new(rx, &status, MessageWriter::new(&out), NodeId::Host);

        status.set_flags(PositionFlags::POSITION_OVERFLOW);
        assert!(task.run_once());
        assert!(!task.run_once());
        assert_eq!(out.len(), 1);
        assert_eq!(
            out.try_read().map(|f| f.message),
            Some(OutgoingMessage::ErrorMessage(ErrorMessage {
                severity: 3,
                error_code: 5,
            }))
        );

        // Cleared by a stop, then raised again.
        status.clear_flags(PositionFlags::POSITION_OVERFLOW);
        assert!(!task.run_once());
        status.set_flags(PositionFlags::POSITION_OVERFLOW);
        assert!(task.run_once());
    }

    #[test]
    fn dropped_notifications_warn_and_clear() {
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let out: CanWriterQueue<4> = TaskQueue::new();
        let (_tx, rx) = acks.split();
        let mut task = MoveStatusReporterTask::new(rx, &status, MessageWriter::new(&out), NodeId::Host);

        status.set_flags(PositionFlags::NOTIFICATION_DROPPED);
        assert!(task.run_once());
        assert!(!status.flags().contains(PositionFlags::NOTIFICATION_DROPPED));
        assert_eq!(
            out.try_read().map(|f| f.message),
            Some(OutgoingMessage::ErrorMessage(ErrorMessage {
                severity: 1,
                error_code: 5,
            }))
        );
    }
}
