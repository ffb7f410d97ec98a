// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Numeric identifier tables shared by every node on the bus.
//!
//! The values are part of the wire protocol. Entries are append-only: a number, once assigned,
//! is never reused for a different meaning.

use super::Error;

/// Declare a `#[repr]` enum with lossless conversion to its raw value and a checked conversion
/// back from it.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr($repr)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),*
        }

        impl $name {
            /// Raw value as carried on the wire.
            #[inline]
            pub const fn raw(self) -> $repr {
                self as $repr
            }
        }

        impl From<$name> for $repr {
            #[inline]
            fn from(value: $name) -> Self {
                value as $repr
            }
        }

        impl TryFrom<$repr> for $name {
            type Error = Error;

            fn try_from(raw: $repr) -> Result<Self, Error> {
                match raw {
                    $( v if v == $value => Ok($name::$variant), )*
                    _ => Err(Error::UnknownId),
                }
            }
        }
    };
}

wire_enum! {
    /// Frame class, carried in the low 7 bits of the arbitration id.
    pub enum FunctionCode: u8 {
        NetworkManagement = 0x0,
        Sync = 0x1,
        Error = 0x2,
        Command = 0x3,
        Status = 0x4,
        Parameters = 0x5,
        Bootloader = 0x6,
        Heartbeat = 0x7,
    }
}

wire_enum! {
    /// Logical bus address of a node.
    ///
    /// Some addresses name a group of axes rather than one axis (`Gripper`, `Head`). A node for
    /// one of those axes accepts traffic for its own id and for its group.
    pub enum NodeId: u8 {
        Broadcast = 0x00,
        Host = 0x10,
        Gripper = 0x20,
        GripperZ = 0x21,
        GripperG = 0x22,
        GantryX = 0x30,
        HepaUv = 0x32,
        GantryY = 0x40,
        Head = 0x50,
        HeadL = 0x51,
        HeadR = 0x52,
        PipetteLeft = 0x60,
        PipetteRight = 0x70,
        GripperBootloader = 0x2f,
        GantryXBootloader = 0x3f,
        HepaUvBootloader = 0x3e,
        GantryYBootloader = 0x4f,
        HeadBootloader = 0x5f,
        PipetteLeftBootloader = 0x6f,
        PipetteRightBootloader = 0x7f,
    }
}

impl NodeId {
    /// The group id this node also answers to, if it is one axis of a multi-axis node.
    pub const fn group_alias(self) -> Option<NodeId> {
        match self {
            NodeId::GripperZ | NodeId::GripperG => Some(NodeId::Gripper),
            NodeId::HeadL | NodeId::HeadR => Some(NodeId::Head),
            _ => None,
        }
    }

    /// Whether a frame addressed to the raw node id `target` is meant for this node.
    pub fn accepts(self, target: u8) -> bool {
        target == NodeId::Broadcast.raw()
            || target == self.raw()
            || self.group_alias().map_or(false, |g| g.raw() == target)
    }
}

wire_enum! {
    /// Every message kind on the bus.
    ///
    /// Variant names match the catalog struct that carries the payload, where one exists.
    pub enum MessageId: u16 {
        HeartbeatRequest = 0x3ff,
        HeartbeatResponse = 0x3fe,
        DeviceInfoRequest = 0x302,
        DeviceInfoResponse = 0x303,
        TaskInfoRequest = 0x304,
        TaskInfoResponse = 0x305,
        InstrumentInfoRequest = 0x306,

        StopRequest = 0x0,
        GetStatusRequest = 0x1,
        ErrorMessage = 0x2,
        GetStatusResponse = 0x5,
        EnableMotorRequest = 0x6,
        DisableMotorRequest = 0x7,
        ReadLimitSwitchRequest = 0x8,
        ReadLimitSwitchResponse = 0x9,

        MoveRequest = 0x10,
        MotorPositionRequest = 0x12,
        MoveCompleted = 0x13,
        MotorPositionResponse = 0x14,
        AddLinearMoveRequest = 0x15,
        GetMoveGroupRequest = 0x16,
        GetMoveGroupResponse = 0x17,
        ExecuteMoveGroupRequest = 0x18,
        ClearAllMoveGroupsRequest = 0x19,
        HomeRequest = 0x20,

        WriteMotorDriverRegister = 0x30,
        ReadMotorDriverRegister = 0x31,
        ReadMotorDriverRegisterResponse = 0x32,
        WriteMotorCurrentRequest = 0x33,

        SetMotionConstraints = 0x101,
        GetMotionConstraintsRequest = 0x102,
        GetMotionConstraintsResponse = 0x103,

        WriteEeprom = 0x201,
        ReadEepromRequest = 0x202,
        ReadEepromResponse = 0x203,

        ReadPresenceSensingVoltageRequest = 0x600,
        ReadPresenceSensingVoltageResponse = 0x601,
    }
}

wire_enum! {
    /// Error codes carried by [`ErrorMessage`](super::messages::ErrorMessage).
    pub enum ErrorCode: u16 {
        Ok = 0x0,
        InvalidSize = 0x1,
        BadChecksum = 0x2,
        InvalidByteCount = 0x3,
        InvalidInput = 0x4,
        Hardware = 0x5,
        Timeout = 0x6,
        EstopDetected = 0x7,
        CollisionDetected = 0x8,
        LabwareDropped = 0x9,
        EstopReleased = 0xa,
        MotorBusy = 0xb,
        StopRequested = 0xc,
        OverPressure = 0xd,
    }
}

wire_enum! {
    pub enum ErrorSeverity: u16 {
        None = 0x0,
        Warning = 0x1,
        Recoverable = 0x2,
        Unrecoverable = 0x3,
    }
}
