// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Motor driver task: register pokes and current settings for the TMC2130.

use crate::can::messages::{
    ReadMotorDriverRegister, ReadMotorDriverRegisterResponse, WriteMotorCurrentRequest,
    WriteMotorDriverRegister,
};
use crate::can::writer::MessageWriter;
use crate::can::NodeId;
use crate::drivers::tmc2130::{is_valid_address, RegisterAccess, Tmc2130};
use crate::logging::{debug, error, warn};
use crate::message_set;
use crate::queue::{MessageHandler, TaskQueue};

message_set! {
    pub enum MotorDriverRequest {
        WriteMotorDriverRegister,
        ReadMotorDriverRegister,
        WriteMotorCurrentRequest,
    }
}

pub type MotorDriverQueue<const N: usize> = TaskQueue<MotorDriverRequest, N>;

pub struct MotorDriverMessageHandler<'a, R, const W: usize> {
    driver: Tmc2130<R>,
    writer: MessageWriter<'a, W>,
    host: NodeId,
}

impl<'a, R, const W: usize> MotorDriverMessageHandler<'a, R, W>
where
    R: RegisterAccess,
{
    pub fn new(driver: Tmc2130<R>, writer: MessageWriter<'a, W>, host: NodeId) -> Self {
        Self { driver, writer, host }
    }

    pub fn driver(&self) -> &Tmc2130<R> {
        &self.driver
    }
}

impl<'a, R, const W: usize> MessageHandler<MotorDriverRequest> for MotorDriverMessageHandler<'a, R, W>
where
    R: RegisterAccess,
{
    fn handle_message(&mut self, message: MotorDriverRequest) {
        match message {
            MotorDriverRequest::WriteMotorDriverRegister(m) => {
                debug!("write driver register {}: {}", m.reg_address, m.data);
                if !is_valid_address(m.reg_address) {
                    warn!("write to invalid driver register {}", m.reg_address);
                } else if self.driver.write(m.reg_address, m.data).is_err() {
                    error!("driver register {} write failed", m.reg_address);
                }
            }
            MotorDriverRequest::ReadMotorDriverRegister(m) => {
                let data = if is_valid_address(m.reg_address) {
                    self.driver.read(m.reg_address).unwrap_or_else(|_| {
                        error!("driver register {} read failed", m.reg_address);
                        0
                    })
                } else {
                    warn!("read of invalid driver register {}", m.reg_address);
                    0
                };
                self.writer.send_can_message(
                    self.host,
                    ReadMotorDriverRegisterResponse {
                        reg_address: m.reg_address,
                        data,
                    },
                );
            }
            MotorDriverRequest::WriteMotorCurrentRequest(m) => {
                debug!("write motor current: hold {}, run {}", m.hold_current, m.run_current);
                if self.driver.set_currents(m.hold_current, m.run_current).is_err() {
                    error!("motor current write failed");
                }
            }
        }
    }
}
