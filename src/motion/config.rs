// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Mechanical and per-node configuration.

use core::f32::consts::PI;

use crate::can::messages::{GetMotionConstraintsResponse, SetMotionConstraints};
use crate::can::NodeId;

/// How one motor revolution turns into linear travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MechanicalConfig {
    /// Lead screw with the given pitch in mm per revolution.
    LeadScrew { lead_screw_pitch: f32 },
    /// Belt over a pulley of the given diameter in mm.
    Belt { pulley_diameter: f32 },
}

impl MechanicalConfig {
    pub fn mm_per_rev(&self) -> f32 {
        match *self {
            MechanicalConfig::LeadScrew { lead_screw_pitch } => lead_screw_pitch,
            MechanicalConfig::Belt { pulley_diameter } => PI * pulley_diameter,
        }
    }
}

/// One linear axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMotionConfig {
    pub mech_config: MechanicalConfig,
    pub steps_per_rev: f32,
    pub microstep: f32,
    /// Motor revolutions per output revolution.
    pub gear_reduction_ratio: f32,
}

impl LinearMotionConfig {
    pub fn get_steps_per_mm(&self) -> f32 {
        self.steps_per_rev * self.microstep * self.gear_reduction_ratio
            / self.mech_config.mm_per_rev()
    }

    pub fn get_steps_per_um(&self) -> f32 {
        self.get_steps_per_mm() / 1000.0
    }

    pub fn get_um_per_step(&self) -> f32 {
        1000.0 / self.get_steps_per_mm()
    }
}

/// Limits applied to every queued move. Same units as the wire: velocity in mm/tick and
/// acceleration in µm/tick², signed q0.31. A maximum of zero means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionConstraints {
    pub min_velocity: i32,
    pub max_velocity: i32,
    pub min_acceleration: i32,
    pub max_acceleration: i32,
}

impl MotionConstraints {
    /// Clamp `velocity` to `±max_velocity`.
    pub fn clamp_velocity(&self, velocity: i32) -> i32 {
        clamp_magnitude(velocity, self.max_velocity)
    }

    /// Clamp `acceleration` to `±max_acceleration`.
    pub fn clamp_acceleration(&self, acceleration: i32) -> i32 {
        clamp_magnitude(acceleration, self.max_acceleration)
    }
}

fn clamp_magnitude(value: i32, max: i32) -> i32 {
    if max <= 0 {
        return value;
    }
    value.clamp(-max, max)
}

impl From<SetMotionConstraints> for MotionConstraints {
    fn from(m: SetMotionConstraints) -> Self {
        Self {
            min_velocity: m.min_velocity,
            max_velocity: m.max_velocity,
            min_acceleration: m.min_acceleration,
            max_acceleration: m.max_acceleration,
        }
    }
}

impl From<MotionConstraints> for GetMotionConstraintsResponse {
    fn from(c: MotionConstraints) -> Self {
        Self {
            min_velocity: c.min_velocity,
            max_velocity: c.max_velocity,
            min_acceleration: c.min_acceleration,
            max_acceleration: c.max_acceleration,
        }
    }
}

/// Identity of this node on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    pub node_id: NodeId,
    /// Destination for every reply and notification.
    pub host: NodeId,
    /// Reported in `DeviceInfoResponse`.
    pub version: u32,
}

impl NodeConfig {
    pub const fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            host: NodeId::Host,
            version: 0,
        }
    }
}
