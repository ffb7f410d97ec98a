// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Motion layer
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`fixed_point`] | `q31.31` positions and wire fraction scaling |
//! | [`config`] | Axis mechanics, motion constraints, node identity |
//! | [`moves`] | Step-unit moves, stop conditions, completion acks |
//! | [`move_group`] | Staged move tables |
//! | [`position`] | Status shared with the interrupt |
//! | [`controller`] | Wire moves to step moves |
//! | [`pulse`] | The per-tick step generator |

pub mod config;
pub mod controller;
pub mod fixed_point;
pub mod move_group;
pub mod moves;
pub mod position;
pub mod pulse;

pub use config::{LinearMotionConfig, MechanicalConfig, MotionConstraints, NodeConfig};
pub use controller::{MotionController, MotorEnable};
pub use move_group::{MoveGroup, MoveGroupManager};
pub use moves::{Ack, AckMessageId, Move, MoveStopCondition, MoveVariant};
pub use position::{PositionFlags, PositionStatus};
pub use pulse::{PulseGenerator, PulseState, StepperHardware};
