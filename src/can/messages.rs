// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! The message catalog.
//!
//! Each message is a plain record tagged with its [`MessageId`]. Fields are encoded big-endian in
//! declaration order with no padding between them. A payload longer than the layout (DLC padding)
//! parses fine; a shorter one is rejected.

use super::bytes::{ByteReader, ByteWriter, WireField};
use super::ids::MessageId;
use super::Error;

/// A typed payload that knows its own id.
pub trait Message: Sized {
    const ID: MessageId;
    /// Encoded payload size in bytes.
    const SIZE: usize;

    /// Decode from a received payload. Never reads past `payload`.
    fn parse(payload: &[u8]) -> Result<Self, Error>;

    /// Encode into `buf`, returning the number of bytes written.
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, Error>;
}

/// Declare catalog messages. The struct name must match a [`MessageId`] variant.
macro_rules! can_message {
    ($(
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    )*) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl Message for $name {
            const ID: MessageId = MessageId::$name;
            const SIZE: usize = 0 $( + <$ty as WireField>::SIZE )*;

            #[allow(unused_mut, unused_variables)]
            fn parse(payload: &[u8]) -> Result<Self, Error> {
                let mut reader = ByteReader::new(payload);
                $( let $field = <$ty as WireField>::read(&mut reader)?; )*
                Ok(Self { $( $field, )* })
            }

            #[allow(unused_mut, unused_variables)]
            fn serialize(&self, buf: &mut [u8]) -> Result<usize, Error> {
                let mut writer = ByteWriter::new(buf);
                $( WireField::write(&self.$field, &mut writer)?; )*
                Ok(writer.position())
            }
        }

        impl $crate::can::parser::MessageSet for $name {
            #[inline]
            fn accepts(id: MessageId) -> bool {
                id == <Self as Message>::ID
            }

            fn parse(id: MessageId, payload: &[u8]) -> Option<Self> {
                if id == <Self as Message>::ID {
                    <Self as Message>::parse(payload).ok()
                } else {
                    None
                }
            }

            #[inline]
            fn message_id(&self) -> MessageId {
                <Self as Message>::ID
            }

            #[inline]
            fn serialize(&self, buf: &mut [u8]) -> Result<usize, Error> {
                <Self as Message>::serialize(self, buf)
            }
        }
    )*};
}

can_message! {
    /// Liveness probe from the host.
    pub struct HeartbeatRequest {}

    pub struct HeartbeatResponse {}

    pub struct DeviceInfoRequest {}

    pub struct DeviceInfoResponse {
        pub version: u32,
    }

    /// Stop all motion and drop every staged move.
    pub struct StopRequest {}

    pub struct EnableMotorRequest {}

    pub struct DisableMotorRequest {}

    pub struct ReadLimitSwitchRequest {}

    pub struct ReadLimitSwitchResponse {
        /// 1 while the switch is pressed.
        pub switch_status: u8,
    }

    pub struct MotorPositionRequest {}

    pub struct MotorPositionResponse {
        /// Position in µm.
        pub current_position: u32,
        pub encoder_position: i32,
        /// Bit set of [`PositionFlags`](crate::motion::PositionFlags).
        pub position_flags: u8,
    }

    /// Velocity is mm/tick and acceleration µm/tick², both signed q0.31.
    pub struct SetMotionConstraints {
        pub min_velocity: i32,
        pub max_velocity: i32,
        pub min_acceleration: i32,
        pub max_acceleration: i32,
    }

    pub struct GetMotionConstraintsRequest {}

    pub struct GetMotionConstraintsResponse {
        pub min_velocity: i32,
        pub max_velocity: i32,
        pub min_acceleration: i32,
        pub max_acceleration: i32,
    }

    /// Stage one constant-acceleration move in a move group.
    pub struct AddLinearMoveRequest {
        pub group_id: u8,
        pub seq_id: u8,
        /// Move length in timer ticks.
        pub duration: u32,
        /// µm/tick², signed q0.31.
        pub acceleration: i32,
        /// mm/tick, signed q0.31.
        pub velocity: i32,
        /// Bit set of [`MoveStopCondition`](crate::motion::MoveStopCondition).
        pub request_stop_condition: u8,
    }

    /// Stage a move toward the limit switch. Stops early when the switch triggers.
    pub struct HomeRequest {
        pub group_id: u8,
        pub seq_id: u8,
        pub duration: u32,
        pub velocity: i32,
    }

    pub struct GetMoveGroupRequest {
        pub group_id: u8,
    }

    pub struct GetMoveGroupResponse {
        pub group_id: u8,
        pub num_moves: u8,
        pub total_duration: u32,
    }

    pub struct ExecuteMoveGroupRequest {
        pub group_id: u8,
        pub start_trigger: u8,
        pub cancel_trigger: u8,
    }

    pub struct ClearAllMoveGroupsRequest {}

    /// Sent once per finished move.
    pub struct MoveCompleted {
        pub group_id: u8,
        pub seq_id: u8,
        /// Whole steps.
        pub current_position: u32,
        pub encoder_position: i32,
        /// [`AckMessageId`](crate::motion::AckMessageId) value.
        pub ack_id: u8,
    }

    pub struct ErrorMessage {
        pub severity: u16,
        pub error_code: u16,
    }

    pub struct WriteMotorDriverRegister {
        pub reg_address: u8,
        pub data: u32,
    }

    pub struct ReadMotorDriverRegister {
        pub reg_address: u8,
    }

    pub struct ReadMotorDriverRegisterResponse {
        pub reg_address: u8,
        pub data: u32,
    }

    /// Currents in amps, unsigned q16.16. Zero leaves that current unchanged.
    pub struct WriteMotorCurrentRequest {
        pub hold_current: u32,
        pub run_current: u32,
    }
}

impl ErrorMessage {
    pub fn new(severity: super::ErrorSeverity, code: super::ErrorCode) -> Self {
        Self {
            severity: severity.raw(),
            error_code: code.raw(),
        }
    }
}
