// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Motion controller task.
//!
//! Bus requests arrive through the dispatcher. Staged moves and stops arrive from the move group
//! task, so a stop always lands behind the moves of an execute that preceded it. Replies go to the
//! host.

use crate::can::messages::{
    DisableMotorRequest, EnableMotorRequest, GetMotionConstraintsRequest,
    GetMotionConstraintsResponse, MotorPositionRequest, MotorPositionResponse,
    ReadLimitSwitchRequest, ReadLimitSwitchResponse, SetMotionConstraints, StopRequest,
};
use crate::can::writer::MessageWriter;
use crate::can::NodeId;
use crate::logging::{debug, info};
use crate::message_set;
use crate::motion::controller::{MotionController, MotorEnable};
use crate::motion::moves::MoveVariant;
use crate::queue::{MessageHandler, TaskQueue};

message_set! {
    /// Bus requests the motion controller answers.
    pub enum MotionControlRequest {
        EnableMotorRequest,
        DisableMotorRequest,
        SetMotionConstraints,
        GetMotionConstraintsRequest,
        MotorPositionRequest,
        ReadLimitSwitchRequest,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionControllerTaskMessage {
    Request(MotionControlRequest),
    /// Forwarded by the move group task on execute.
    Move(MoveVariant),
    /// Forwarded by the move group task after it clears its groups.
    Stop(StopRequest),
}

impl From<MotionControlRequest> for MotionControllerTaskMessage {
    fn from(m: MotionControlRequest) -> Self {
        Self::Request(m)
    }
}

impl From<MoveVariant> for MotionControllerTaskMessage {
    fn from(m: MoveVariant) -> Self {
        Self::Move(m)
    }
}

impl From<StopRequest> for MotionControllerTaskMessage {
    fn from(m: StopRequest) -> Self {
        Self::Stop(m)
    }
}

pub type MotionControllerQueue<const N: usize> = TaskQueue<MotionControllerTaskMessage, N>;

pub struct MotionControllerMessageHandler<'a, E, const M: usize, const W: usize> {
    controller: MotionController<'a, E, M>,
    writer: MessageWriter<'a, W>,
    host: NodeId,
}

impl<'a, E, const M: usize, const W: usize> MotionControllerMessageHandler<'a, E, M, W>
where
    E: MotorEnable,
{
    pub fn new(controller: MotionController<'a, E, M>, writer: MessageWriter<'a, W>, host: NodeId) -> Self {
        Self {
            controller,
            writer,
            host,
        }
    }

    pub fn controller(&self) -> &MotionController<'a, E, M> {
        &self.controller
    }

    fn handle_request(&mut self, request: MotionControlRequest) {
        match request {
            MotionControlRequest::EnableMotorRequest(_) => {
                info!("enable motor");
                self.controller.enable_motor();
            }
            MotionControlRequest::DisableMotorRequest(_) => {
                info!("disable motor");
                self.controller.disable_motor();
            }
            MotionControlRequest::SetMotionConstraints(m) => {
                debug!(
                    "set motion constraints: vel {}..{}, acc {}..{}",
                    m.min_velocity, m.max_velocity, m.min_acceleration, m.max_acceleration
                );
                self.controller.set_motion_constraints(m.into());
            }
            MotionControlRequest::GetMotionConstraintsRequest(_) => {
                let response = GetMotionConstraintsResponse::from(self.controller.get_motion_constraints());
                self.writer.send_can_message(self.host, response);
            }
            MotionControlRequest::MotorPositionRequest(_) => {
                let response = MotorPositionResponse {
                    current_position: self.controller.read_motor_position(),
                    encoder_position: self.controller.read_encoder_position(),
                    position_flags: self.controller.get_position_flags().bits(),
                };
                self.writer.send_can_message(self.host, response);
            }
            MotionControlRequest::ReadLimitSwitchRequest(_) => {
                let response = ReadLimitSwitchResponse {
                    switch_status: u8::from(self.controller.read_limit_switch()),
                };
                self.writer.send_can_message(self.host, response);
            }
        }
    }
}

impl<'a, E, const M: usize, const W: usize> MessageHandler<MotionControllerTaskMessage>
    for MotionControllerMessageHandler<'a, E, M, W>
where
    E: MotorEnable,
{
    fn handle_message(&mut self, message: MotionControllerTaskMessage) {
        match message {
            MotionControllerTaskMessage::Request(request) => self.handle_request(request),
            MotionControllerTaskMessage::Move(m) => {
                self.controller.move_variant(&m);
            }
            MotionControllerTaskMessage::Stop(_) => {
                info!("stop");
                self.controller.stop();
            }
        }
    }
}
