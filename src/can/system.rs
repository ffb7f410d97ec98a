// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Node-level requests answered directly from the CAN receive path.

use super::ids::NodeId;
use super::messages::{DeviceInfoRequest, DeviceInfoResponse, HeartbeatRequest, HeartbeatResponse};
use super::writer::MessageWriter;
use crate::logging::trace;
use crate::message_set;
use crate::queue::MessageHandler;

message_set! {
    pub enum SystemMessage {
        HeartbeatRequest,
        DeviceInfoRequest,
    }
}

pub struct SystemMessageHandler<'a, const N: usize> {
    writer: MessageWriter<'a, N>,
    reply_to: NodeId,
    version: u32,
}

impl<'a, const N: usize> SystemMessageHandler<'a, N> {
    pub fn new(writer: MessageWriter<'a, N>, reply_to: NodeId, version: u32) -> Self {
        Self {
            writer,
            reply_to,
            version,
        }
    }
}

impl<'a, const N: usize> MessageHandler<SystemMessage> for SystemMessageHandler<'a, N> {
    fn handle_message(&mut self, message: SystemMessage) {
        match message {
            SystemMessage::HeartbeatRequest(_) => {
                trace!("heartbeat");
                self.writer.send_can_message(self.reply_to, HeartbeatResponse {});
            }
            SystemMessage::DeviceInfoRequest(_) => {
                self.writer.send_can_message(
                    self.reply_to,
                    DeviceInfoResponse {
                        version: self.version,
                    },
                );
            }
        }
    }
}
