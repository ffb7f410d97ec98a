// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Outgoing frames.
//!
//! Tasks never touch the bus. They hand replies to a [`MessageWriter`], which addresses them and
//! queues them for the [`CanWriterTask`], the only code that transmits on the [`CanBus`].

use super::arbitration::ArbitrationId;
use super::dlc::{Dlc, MAX_PAYLOAD};
use super::filter::CanBus;
use super::ids::{FunctionCode, NodeId};
use super::messages::*;
use super::parser::MessageSet;
use super::Error;
use crate::logging::{error, warn};
use crate::message_set;
use crate::queue::{MessageQueue, TaskQueue};

message_set! {
    /// Every message this node sends.
    pub enum OutgoingMessage {
        HeartbeatResponse,
        DeviceInfoResponse,
        ReadLimitSwitchResponse,
        MotorPositionResponse,
        GetMotionConstraintsResponse,
        GetMoveGroupResponse,
        MoveCompleted,
        ErrorMessage,
        ReadMotorDriverRegisterResponse,
    }
}

/// An addressed message waiting for the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanMessage {
    pub arbitration_id: ArbitrationId,
    pub message: OutgoingMessage,
}

/// Queue feeding the CAN writer task.
pub type CanWriterQueue<const N: usize> = TaskQueue<CanMessage, N>;

/// Cheap handle tasks use to send replies.
#[derive(Clone, Copy)]
pub struct MessageWriter<'a, const N: usize> {
    queue: &'a CanWriterQueue<N>,
}

impl<'a, const N: usize> MessageWriter<'a, N> {
    pub fn new(queue: &'a CanWriterQueue<N>) -> Self {
        Self { queue }
    }

    /// Address `message` to `destination` and queue it. Returns `false` if the writer queue was
    /// full and the message was dropped.
    pub fn send_can_message(&self, destination: NodeId, message: impl Into<OutgoingMessage>) -> bool {
        let message = message.into();
        let arbitration_id = ArbitrationId::new(
            destination,
            message.message_id(),
            FunctionCode::NetworkManagement,
        );
        match self.queue.try_write(CanMessage {
            arbitration_id,
            message,
        }) {
            Ok(()) => true,
            Err(_) => {
                warn!("can writer queue full, dropping {:?}", message.message_id());
                false
            }
        }
    }
}

/// Drains the writer queue onto the bus.
///
/// The bus is lent in on every run; the task never owns it, so the receive path can keep using
/// the same peripheral.
pub struct CanWriterTask<'a, const N: usize> {
    queue: &'a CanWriterQueue<N>,
}

impl<'a, const N: usize> CanWriterTask<'a, N> {
    pub fn new(queue: &'a CanWriterQueue<N>) -> Self {
        Self { queue }
    }

    /// Send at most one queued frame. Returns `true` if a frame was taken off the queue.
    pub fn run_once<B: CanBus + ?Sized>(&mut self, bus: &mut B) -> bool {
        match self.queue.read() {
            Ok(frame) => {
                if let Err(e) = send(bus, &frame) {
                    error!("failed to send {:?}: {:?}", frame.message.message_id(), e);
                }
                true
            }
            Err(_) => false,
        }
    }
}

fn send<B: CanBus + ?Sized>(bus: &mut B, frame: &CanMessage) -> Result<(), Error> {
    let mut buf = [0u8; MAX_PAYLOAD];
    let len = frame.message.serialize(&mut buf)?;
    bus.send(frame.arbitration_id, &buf[..len], Dlc::for_len(len))
}
