// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! 29-bit extended arbitration id.
//!
//! Bit layout, least significant first:
//!
//! | Bits  | Field           | Width |
//! | ----- | --------------- | ----- |
//! | 0-6   | `function_code` | 7     |
//! | 7-14  | `node_id`       | 8     |
//! | 15-28 | `message_id`    | 14    |
//! | 29-31 | reserved, zero  | 3     |

use super::ids::{FunctionCode, MessageId, NodeId};
use super::Error;

const FUNCTION_CODE_SHIFT: u32 = 0;
const FUNCTION_CODE_MASK: u32 = 0x7F;
const NODE_ID_SHIFT: u32 = 7;
const NODE_ID_MASK: u32 = 0xFF;
const MESSAGE_ID_SHIFT: u32 = 15;
const MESSAGE_ID_MASK: u32 = 0x3FFF;

/// Mask selecting only the node id bits. Used to build acceptance filters.
pub const NODE_ID_FILTER_MASK: u32 = NODE_ID_MASK << NODE_ID_SHIFT;

/// Unpacked arbitration id fields, as raw numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArbitrationFields {
    pub node_id: u8,
    pub message_id: u16,
    pub function_code: u8,
}

/// Pack raw fields into a 29-bit identifier. Out of range bits are masked off.
#[inline]
pub const fn pack(node_id: u8, message_id: u16, function_code: u8) -> u32 {
    ((function_code as u32 & FUNCTION_CODE_MASK) << FUNCTION_CODE_SHIFT)
        | ((node_id as u32 & NODE_ID_MASK) << NODE_ID_SHIFT)
        | ((message_id as u32 & MESSAGE_ID_MASK) << MESSAGE_ID_SHIFT)
}

/// Split a 29-bit identifier into its fields. The reserved high bits are ignored.
#[inline]
pub const fn unpack(id: u32) -> ArbitrationFields {
    ArbitrationFields {
        node_id: ((id >> NODE_ID_SHIFT) & NODE_ID_MASK) as u8,
        message_id: ((id >> MESSAGE_ID_SHIFT) & MESSAGE_ID_MASK) as u16,
        function_code: ((id >> FUNCTION_CODE_SHIFT) & FUNCTION_CODE_MASK) as u8,
    }
}

/// An arbitration id as received from or sent to the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArbitrationId(u32);

impl ArbitrationId {
    /// Wrap a raw identifier, clearing the reserved bits.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        let f = unpack(raw);
        Self(pack(f.node_id, f.message_id, f.function_code))
    }

    /// Build an id addressed to `node`.
    #[inline]
    pub const fn new(node: NodeId, message: MessageId, function: FunctionCode) -> Self {
        Self(pack(node.raw(), message.raw(), function.raw()))
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn fields(self) -> ArbitrationFields {
        unpack(self.0)
    }

    /// Raw destination node id.
    #[inline]
    pub const fn node_id_raw(self) -> u8 {
        unpack(self.0).node_id
    }

    /// Raw message id.
    #[inline]
    pub const fn message_id_raw(self) -> u16 {
        unpack(self.0).message_id
    }

    pub fn node_id(self) -> Result<NodeId, Error> {
        NodeId::try_from(self.node_id_raw())
    }

    pub fn message_id(self) -> Result<MessageId, Error> {
        MessageId::try_from(self.message_id_raw())
    }

    pub fn function_code(self) -> Result<FunctionCode, Error> {
        FunctionCode::try_from(unpack(self.0).function_code)
    }
}

impl From<ArbitrationId> for u32 {
    fn from(id: ArbitrationId) -> Self {
        id.0
    }
}
