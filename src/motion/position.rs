// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Position state shared between the pulse generator interrupt and the tasks.
//!
//! Every access is a single atomic operation. Nothing here takes a lock, so the interrupt never
//! waits on task code.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU8, Ordering};

/// Bit set describing how far the reported position can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionFlags(u8);

impl PositionFlags {
    pub const NONE: Self = Self(0x0);
    /// Step counter matches the physical axis (set by homing).
    pub const STEPPER_POSITION_OK: Self = Self(0x1);
    pub const ENCODER_POSITION_OK: Self = Self(0x2);
    /// Position left the representable range. The axis is halted.
    pub const POSITION_OVERFLOW: Self = Self(0x4);
    /// A completion notice was lost because the ack queue was full.
    pub const NOTIFICATION_DROPPED: Self = Self(0x8);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

/// Per-axis status. Written by the pulse generator, read by everyone else.
pub struct PositionStatus {
    flags: AtomicU8,
    position: AtomicU32,
    encoder: AtomicI32,
    limit_switch: AtomicBool,
    cancel: AtomicBool,
}

impl PositionStatus {
    pub const fn new() -> Self {
        Self {
            flags: AtomicU8::new(0),
            position: AtomicU32::new(0),
            encoder: AtomicI32::new(0),
            limit_switch: AtomicBool::new(false),
            cancel: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn flags(&self) -> PositionFlags {
        PositionFlags(self.flags.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set_flags(&self, flags: PositionFlags) {
        self.flags.fetch_or(flags.0, Ordering::AcqRel);
    }

    #[inline]
    pub fn clear_flags(&self, flags: PositionFlags) {
        self.flags.fetch_and(!flags.0, Ordering::AcqRel);
    }

    /// Current position in whole steps.
    #[inline]
    pub fn position(&self) -> u32 {
        self.position.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_position(&self, steps: u32) {
        self.position.store(steps, Ordering::Relaxed);
    }

    #[inline]
    pub fn encoder_position(&self) -> i32 {
        self.encoder.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_encoder_position(&self, pulses: i32) {
        self.encoder.store(pulses, Ordering::Relaxed);
    }

    /// Limit switch level as last sampled by the pulse generator.
    #[inline]
    pub fn limit_switch(&self) -> bool {
        self.limit_switch.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_limit_switch(&self, pressed: bool) {
        self.limit_switch.store(pressed, Ordering::Relaxed);
    }

    /// Ask the pulse generator to abandon its move and drain its queue on the next tick.
    #[inline]
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Consume a pending cancel request.
    #[inline]
    pub fn take_cancel_request(&self) -> bool {
        self.cancel.swap(false, Ordering::AcqRel)
    }
}

impl Default for PositionStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_set_and_clear_independently() {
        let s = PositionStatus::new();
        s.set_flags(PositionFlags::STEPPER_POSITION_OK);
        s.set_flags(PositionFlags::NOTIFICATION_DROPPED);
        assert_eq!(s.flags().bits(), 0x9);
        s.clear_flags(PositionFlags::STEPPER_POSITION_OK);
        assert_eq!(s.flags(), PositionFlags::NOTIFICATION_DROPPED);
    }

    #[test]
    fn cancel_is_taken_once() {
        let s = PositionStatus::new();
        assert!(!s.take_cancel_request());
        s.request_cancel();
        assert!(s.take_cancel_request());
        assert!(!s.take_cancel_request());
    }
}
