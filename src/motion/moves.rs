// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Move records passed between the motion controller and the pulse generator.

use super::fixed_point::Q31_31;
use crate::can::messages::{AddLinearMoveRequest, HomeRequest};

/// Conditions that may end a move before its tick budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveStopCondition(u8);

impl MoveStopCondition {
    pub const NONE: Self = Self(0x0);
    pub const LIMIT_SWITCH: Self = Self(0x1);
    pub const SYNC_LINE: Self = Self(0x2);
    pub const ENCODER_POSITION: Self = Self(0x4);
    pub const GRIPPER_FORCE: Self = Self(0x8);
    pub const STALL: Self = Self(0x10);
    pub const IGNORE_STALLS: Self = Self(0x20);
    pub const LIMIT_SWITCH_BACKOFF: Self = Self(0x40);

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
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

/// Why a move ended. Reported to the host in `MoveCompleted::ack_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AckMessageId {
    CompleteWithoutCondition = 0x1,
    StoppedByCondition = 0x2,
    Timeout = 0x3,
    PositionError = 0x4,
    ConditionMet = 0x8,
}

/// A staged move, as stored in a move group slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveVariant {
    Linear(AddLinearMoveRequest),
    Home(HomeRequest),
}

impl MoveVariant {
    pub fn group_id(&self) -> u8 {
        match self {
            MoveVariant::Linear(m) => m.group_id,
            MoveVariant::Home(m) => m.group_id,
        }
    }

    pub fn seq_id(&self) -> u8 {
        match self {
            MoveVariant::Linear(m) => m.seq_id,
            MoveVariant::Home(m) => m.seq_id,
        }
    }

    /// Length of the move in ticks.
    pub fn duration(&self) -> u32 {
        match self {
            MoveVariant::Linear(m) => m.duration,
            MoveVariant::Home(m) => m.duration,
        }
    }
}

impl From<AddLinearMoveRequest> for MoveVariant {
    fn from(m: AddLinearMoveRequest) -> Self {
        MoveVariant::Linear(m)
    }
}

impl From<HomeRequest> for MoveVariant {
    fn from(m: HomeRequest) -> Self {
        MoveVariant::Home(m)
    }
}

/// A move in step units, ready for the pulse generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Move {
    pub group_id: u8,
    pub seq_id: u8,
    /// Tick budget.
    pub duration: u32,
    /// Steps per tick at the start of the move, `q31.31`.
    pub velocity: Q31_31,
    /// Change in velocity per tick, `q31.31`.
    pub acceleration: Q31_31,
    pub stop_condition: MoveStopCondition,
}

impl Move {
    /// Position reached after the full tick budget when starting at `start`.
    ///
    /// Velocity is updated before position on every tick, so after `d` ticks the move has covered
    /// `v·d + a·d(d+1)/2`. `None` if that leaves the `q31.31` range.
    pub fn target_from(&self, start: Q31_31) -> Option<Q31_31> {
        let d = self.duration as i128;
        let travel = self.velocity as i128 * d + self.acceleration as i128 * d * (d + 1) / 2;
        i64::try_from(start as i128 + travel).ok()
    }
}

/// Completion notice from the pulse generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ack {
    pub group_id: u8,
    pub seq_id: u8,
    /// Whole steps.
    pub current_position: u32,
    pub encoder_position: i32,
    pub position_flags: u8,
    pub ack_id: AckMessageId,
}
