// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # CAN protocol layer
//!
//! Everything between a raw bus frame and a typed command:
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`ids`] | Node, message, function code and error tables |
//! | [`arbitration`] | 29-bit arbitration id packing |
//! | [`dlc`] | CAN-FD data length codes |
//! | [`filter`] | Acceptance filters and the [`CanBus`] seam |
//! | [`bytes`] | Big-endian payload cursors |
//! | [`messages`] | The message catalog |
//! | [`parser`] | Closed message sets and the id-driven parser |
//! | [`dispatch`] | Predicate-gated routing to handlers and task queues |
//! | [`writer`] | Outgoing frames and the CAN writer task |
//! | [`system`] | Heartbeat and device-info replies |

pub mod arbitration;
pub mod bytes;
pub mod dispatch;
pub mod dlc;
pub mod filter;
pub mod ids;
pub mod messages;
pub mod parser;
pub mod system;
pub mod writer;

pub use arbitration::ArbitrationId;
pub use filter::CanBus;
pub use ids::{ErrorCode, ErrorSeverity, FunctionCode, MessageId, NodeId};
pub use messages::Message;
pub use parser::{MessageSet, Parser};

/// Errors from the CAN protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Payload ended before every field was read.
    PayloadTooShort,
    /// Output buffer cannot hold the serialized message.
    BufferTooSmall,
    /// Payload does not fit in a single frame on this bus.
    PayloadTooLong,
    /// Raw value has no entry in the id tables.
    UnknownId,
    /// The filter kind or action is not supported by the peripheral.
    UnsupportedFilter,
    /// Transmit or receive failure in the bus peripheral.
    Bus,
}
