// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Move group task: stages moves by group and sequence id, and releases a whole group to the
//! motion controller on execute.
//!
//! Stops pass through here on their way to the motion controller. Both tasks drain their queues in
//! order, so a stop sent after an execute always cancels that execute's moves.

use crate::can::messages::{
    AddLinearMoveRequest, ClearAllMoveGroupsRequest, ExecuteMoveGroupRequest, GetMoveGroupRequest,
    GetMoveGroupResponse, HomeRequest, StopRequest,
};
use crate::can::writer::MessageWriter;
use crate::can::NodeId;
use crate::logging::{debug, info, warn};
use crate::message_set;
use crate::motion::move_group::{MoveGroupManager, MAX_GROUPS, MAX_MOVES_PER_GROUP};
use crate::motion::moves::MoveVariant;
use crate::queue::{MessageHandler, MessageQueue, QueueFull, TaskQueue};

use super::motion_controller::MotionControllerTaskMessage;

message_set! {
    pub enum MoveGroupRequest {
        AddLinearMoveRequest,
        HomeRequest,
        GetMoveGroupRequest,
        ClearAllMoveGroupsRequest,
        ExecuteMoveGroupRequest,
        StopRequest,
    }
}

pub type MoveGroupQueue<const N: usize> = TaskQueue<MoveGroupRequest, N>;

pub struct MoveGroupMessageHandler<
    'a,
    Q: ?Sized,
    const W: usize,
    const G: usize = MAX_GROUPS,
    const N: usize = MAX_MOVES_PER_GROUP,
> {
    groups: MoveGroupManager<G, N>,
    motion_controller: &'a Q,
    writer: MessageWriter<'a, W>,
    host: NodeId,
}

impl<'a, Q, const W: usize, const G: usize, const N: usize> MoveGroupMessageHandler<'a, Q, W, G, N>
where
    Q: MessageQueue<MotionControllerTaskMessage> + ?Sized,
{
    pub fn new(motion_controller: &'a Q, writer: MessageWriter<'a, W>, host: NodeId) -> Self {
        Self {
            groups: MoveGroupManager::new(),
            motion_controller,
            writer,
            host,
        }
    }

    pub fn groups(&self) -> &MoveGroupManager<G, N> {
        &self.groups
    }

    fn stage(&mut self, m: MoveVariant) {
        debug!("stage move {}/{}", m.group_id(), m.seq_id());
        if !self.groups.set_move(m) {
            warn!("move {}/{} rejected: no such slot", m.group_id(), m.seq_id());
        }
    }

    fn execute(&mut self, group_id: u8) {
        let Some(group) = self.groups.get(group_id) else {
            warn!("execute: no group {}", group_id);
            return;
        };
        debug!("execute group {}: {} moves", group_id, group.size());
        for m in group.iter() {
            if self
                .motion_controller
                .try_write(MotionControllerTaskMessage::Move(*m))
                .is_err()
            {
                warn!("motion controller queue full, dropping {}/{}", m.group_id(), m.seq_id());
            }
        }
    }

    /// Clear every group, then queue the stop behind whatever was already forwarded.
    fn stop(&mut self) {
        info!("stop: clearing move groups");
        self.groups.clear_all();
        let Err(QueueFull(stop)) = self.motion_controller.try_write(StopRequest {}.into()) else {
            return;
        };
        warn!("motion controller queue full, discarding it ahead of stop");
        while self.motion_controller.try_read().is_some() {}
        if self.motion_controller.try_write(stop).is_err() {
            warn!("stop not forwarded");
        }
    }

    fn report(&mut self, group_id: u8) {
        let Some(group) = self.groups.get(group_id) else {
            warn!("get move group: no group {}", group_id);
            return;
        };
        let response = GetMoveGroupResponse {
            group_id,
            num_moves: u8::try_from(group.size()).unwrap_or(u8::MAX),
            total_duration: group.get_duration(),
        };
        self.writer.send_can_message(self.host, response);
    }
}

impl<'a, Q, const W: usize, const G: usize, const N: usize> MessageHandler<MoveGroupRequest>
    for MoveGroupMessageHandler<'a, Q, W, G, N>
where
    Q: MessageQueue<MotionControllerTaskMessage> + ?Sized,
{
    fn handle_message(&mut self, message: MoveGroupRequest) {
        match message {
            MoveGroupRequest::AddLinearMoveRequest(m) => self.stage(m.into()),
            MoveGroupRequest::HomeRequest(m) => self.stage(m.into()),
            MoveGroupRequest::GetMoveGroupRequest(m) => self.report(m.group_id),
            MoveGroupRequest::ClearAllMoveGroupsRequest(_) => self.groups.clear_all(),
            MoveGroupRequest::ExecuteMoveGroupRequest(m) => self.execute(m.group_id),
            MoveGroupRequest::StopRequest(_) => self.stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::can::writer::{CanWriterQueue, OutgoingMessage};
    use crate::tasks::motion_controller::MotionControllerQueue;

    fn linear(group_id: u8, seq_id: u8, duration: u32) -> MoveGroupRequest {
        AddLinearMoveRequest {
            group_id,
            seq_id,
            duration,
            ..Default::default()
        }
        .into()
    }

    fn seq_of(message: MotionControllerTaskMessage) -> Option<u8> {
        match message {
            MotionControllerTaskMessage::Move(m) => Some(m.seq_id()),
            MotionControllerTaskMessage::Request(_) | MotionControllerTaskMessage::Stop(_) => None,
        }
    }

    #[test]
    fn execute_forwards_in_slot_order() {
        let mc: MotionControllerQueue<8> = TaskQueue::new();
        let out: CanWriterQueue<4> = TaskQueue::new();
        let mut handler: MoveGroupMessageHandler<'_, _, 4> =
            MoveGroupMessageHandler::new(&mc, MessageWriter::new(&out), NodeId::Host);

        handler.handle_message(linear(0, 2, 30));
        handler.handle_message(linear(0, 0, 10));
        handler.handle_message(linear(1, 0, 99));
        handler.handle_message(ExecuteMoveGroupRequest { group_id: 0, ..Default::default() }.into());

        assert_eq!(mc.try_read().and_then(seq_of), Some(0));
        assert_eq!(mc.try_read().and_then(seq_of), Some(2));
        assert!(mc.try_read().is_none());

        // Executing does not consume the group.
        assert_eq!(handler.groups().get(0).map(|g| g.size()), Some(2));
    }

    #[test]
    fn bad_slots_are_ignored() {
        let mc: MotionControllerQueue<8> = TaskQueue::new();
        let out: CanWriterQueue<4> = TaskQueue::new();
        let mut handler: MoveGroupMessageHandler<'_, _, 4> =
            MoveGroupMessageHandler::new(&mc, MessageWriter::new(&out), NodeId::Host);

        handler.handle_message(linear(0, MAX_MOVES_PER_GROUP as u8, 10));
        handler.handle_message(linear(MAX_GROUPS as u8, 0, 10));
        handler.handle_message(GetMoveGroupRequest { group_id: 0 }.into());
        handler.handle_message(GetMoveGroupRequest { group_id: 7 }.into());

        let reply = out.try_read().unwrap();
        assert_eq!(
            reply.message,
            OutgoingMessage::GetMoveGroupResponse(GetMoveGroupResponse {
                group_id: 0,
                num_moves: 0,
                total_duration: 0,
            })
        );
        assert!(out.try_read().is_none());
    }

    #[test]
    fn stop_and_clear_empty_every_group() {
        let mc: MotionControllerQueue<8> = TaskQueue::new();
        let out: CanWriterQueue<4> = TaskQueue::new();
        let mut handler: MoveGroupMessageHandler<'_, _, 4> =
            MoveGroupMessageHandler::new(&mc, MessageWriter::new(&out), NodeId::Host);

        handler.handle_message(linear(0, 0, 10));
        handler.handle_message(linear(2, 5, 10));
        handler.handle_message(StopRequest {}.into());
        assert!((0..MAX_GROUPS as u8).all(|g| handler.groups().get(g).map_or(false, |g| g.empty())));
        assert!(matches!(mc.try_read(), Some(MotionControllerTaskMessage::Stop(_))));

        handler.handle_message(linear(1, 1, 10));
        handler.handle_message(ClearAllMoveGroupsRequest {}.into());
        assert!(handler.groups().get(1).map_or(false, |g| g.empty()));
    }

    #[test]
    fn stop_queues_behind_executed_moves() {
        let mc: MotionControllerQueue<8> = TaskQueue::new();
        let out: CanWriterQueue<4> = TaskQueue::new();
        let mut handler: MoveGroupMessageHandler<'_, _, 4> =
            MoveGroupMessageHandler::new(&mc, MessageWriter::new(&out), NodeId::Host);

        handler.handle_message(linear(0, 0, 10));
        handler.handle_message(linear(0, 1, 10));
        handler.handle_message(ExecuteMoveGroupRequest { group_id: 0, ..Default::default() }.into());
        handler.handle_message(StopRequest {}.into());

        assert_eq!(mc.try_read().and_then(seq_of), Some(0));
        assert_eq!(mc.try_read().and_then(seq_of), Some(1));
        assert!(matches!(mc.try_read(), Some(MotionControllerTaskMessage::Stop(_))));
        assert!(mc.try_read().is_none());
        assert!(handler.groups().get(0).map_or(false, |g| g.empty()));
    }

    #[test]
    fn stop_displaces_a_full_motion_queue() {
        let mc: MotionControllerQueue<2> = TaskQueue::new();
        let out: CanWriterQueue<4> = TaskQueue::new();
        let mut handler: MoveGroupMessageHandler<'_, _, 4> =
            MoveGroupMessageHandler::new(&mc, MessageWriter::new(&out), NodeId::Host);

        handler.handle_message(linear(0, 0, 10));
        handler.handle_message(linear(0, 1, 10));
        handler.handle_message(ExecuteMoveGroupRequest { group_id: 0, ..Default::default() }.into());
        assert_eq!(mc.len(), 2);

        handler.handle_message(StopRequest {}.into());
        assert_eq!(mc.len(), 1);
        assert!(matches!(mc.try_read(), Some(MotionControllerTaskMessage::Stop(_))));
    }

    #[test]
    fn group_size_reported_saturates() {
        let mc: MotionControllerQueue<1> = TaskQueue::new();
        let out: CanWriterQueue<4> = TaskQueue::new();
        let mut handler: MoveGroupMessageHandler<'_, _, 4, 1, 256> =
            MoveGroupMessageHandler::new(&mc, MessageWriter::new(&out), NodeId::Host);

        for seq_id in 0..=u8::MAX {
            handler.handle_message(linear(0, seq_id, 1));
        }
        assert_eq!(handler.groups().get(0).map(|g| g.size()), Some(256));
        handler.handle_message(GetMoveGroupRequest { group_id: 0 }.into());
        let reply = out.try_read().unwrap();
        assert_eq!(
            reply.message,
            OutgoingMessage::GetMoveGroupResponse(GetMoveGroupResponse {
                group_id: 0,
                num_moves: u8::MAX,
                total_duration: 256,
            })
        );
    }

    #[test]
    fn full_motion_queue_drops_tail() {
        let mc: MotionControllerQueue<1> = TaskQueue::new();
        let out: CanWriterQueue<4> = TaskQueue::new();
        let mut handler: MoveGroupMessageHandler<'_, _, 4> =
            MoveGroupMessageHandler::new(&mc, MessageWriter::new(&out), NodeId::Host);

        handler.handle_message(linear(0, 0, 10));
        handler.handle_message(linear(0, 1, 10));
        handler.handle_message(ExecuteMoveGroupRequest { group_id: 0, ..Default::default() }.into());
        assert_eq!(mc.len(), 1);
        assert_eq!(mc.try_read().and_then(seq_of), Some(0));
    }
}
