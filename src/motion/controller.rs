// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Motion controller: turns catalog moves into step-unit [`Move`]s for the pulse generator.

use heapless::spsc::Producer;

use super::config::{LinearMotionConfig, MotionConstraints};
use super::fixed_point::{fixed_point_multiply, to_fixed_point, Q31_31, RADIX};
use super::moves::{Move, MoveStopCondition, MoveVariant};
use super::position::{PositionFlags, PositionStatus};
use crate::can::messages::{AddLinearMoveRequest, HomeRequest};
use crate::logging::{debug, info, warn};

/// Driver enable line.
pub trait MotorEnable {
    fn enable(&mut self);
    fn disable(&mut self);
}

pub struct MotionController<'a, E, const M: usize> {
    moves: Producer<'a, Move, M>,
    status: &'a PositionStatus,
    config: LinearMotionConfig,
    constraints: MotionConstraints,
    steps_per_mm: Q31_31,
    steps_per_um: Q31_31,
    um_per_step: Q31_31,
    motor: E,
    enabled: bool,
}

impl<'a, E, const M: usize> MotionController<'a, E, M>
where
    E: MotorEnable,
{
    pub fn new(
        moves: Producer<'a, Move, M>,
        status: &'a PositionStatus,
        config: LinearMotionConfig,
        constraints: MotionConstraints,
        motor: E,
    ) -> Self {
        Self {
            moves,
            status,
            config,
            constraints,
            steps_per_mm: to_fixed_point(config.get_steps_per_mm(), RADIX),
            steps_per_um: to_fixed_point(config.get_steps_per_um(), RADIX),
            um_per_step: to_fixed_point(config.get_um_per_step(), RADIX),
            motor,
            enabled: false,
        }
    }

    /// Queue a staged move of either kind.
    pub fn move_variant(&mut self, m: &MoveVariant) -> bool {
        match m {
            MoveVariant::Linear(m) => self.move_linear(m),
            MoveVariant::Home(m) => self.home(m),
        }
    }

    /// Queue a linear move. Returns `false` if it was dropped.
    pub fn move_linear(&mut self, m: &AddLinearMoveRequest) -> bool {
        let velocity = self.constraints.clamp_velocity(m.velocity);
        let acceleration = self.constraints.clamp_acceleration(m.acceleration);
        let (Some(velocity), Some(acceleration)) = (
            fixed_point_multiply(self.steps_per_mm, velocity),
            fixed_point_multiply(self.steps_per_um, acceleration),
        ) else {
            warn!("move {}/{} out of range, dropped", m.group_id, m.seq_id);
            return false;
        };
        self.push(Move {
            group_id: m.group_id,
            seq_id: m.seq_id,
            duration: m.duration,
            velocity,
            acceleration,
            stop_condition: MoveStopCondition::from_bits(m.request_stop_condition),
        })
    }

    /// Queue a homing move: constant velocity until the limit switch trips.
    pub fn home(&mut self, m: &HomeRequest) -> bool {
        let velocity = self.constraints.clamp_velocity(m.velocity);
        let Some(velocity) = fixed_point_multiply(self.steps_per_mm, velocity) else {
            warn!("home {}/{} out of range, dropped", m.group_id, m.seq_id);
            return false;
        };
        self.push(Move {
            group_id: m.group_id,
            seq_id: m.seq_id,
            duration: m.duration,
            velocity,
            acceleration: 0,
            stop_condition: MoveStopCondition::LIMIT_SWITCH,
        })
    }

    fn push(&mut self, m: Move) -> bool {
        if !self.enabled {
            self.enable_motor();
        }
        debug!(
            "queue move {}/{}: {} ticks, {:?}",
            m.group_id, m.seq_id, m.duration, m.stop_condition
        );
        match self.moves.enqueue(m) {
            Ok(()) => true,
            Err(m) => {
                warn!("move queue full, dropping {}/{}", m.group_id, m.seq_id);
                false
            }
        }
    }

    /// Abandon the active move and everything queued behind it.
    ///
    /// Takes effect on the next timer tick.
    pub fn stop(&mut self) {
        info!("stop");
        self.status.request_cancel();
    }

    pub fn enable_motor(&mut self) {
        self.motor.enable();
        self.enabled = true;
    }

    /// Disabling loses the holding torque, so the step count can no longer be trusted.
    pub fn disable_motor(&mut self) {
        self.motor.disable();
        self.status.clear_flags(PositionFlags::STEPPER_POSITION_OK);
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_motion_constraints(&mut self, constraints: MotionConstraints) {
        self.constraints = constraints;
    }

    pub fn get_motion_constraints(&self) -> MotionConstraints {
        self.constraints
    }

    /// Position in µm.
    pub fn read_motor_position(&self) -> u32 {
        let steps = self.status.position() as i128;
        ((self.um_per_step as i128 * steps) >> RADIX) as u32
    }

    pub fn read_encoder_position(&self) -> i32 {
        self.status.encoder_position()
    }

    pub fn read_limit_switch(&self) -> bool {
        self.status.limit_switch()
    }

    pub fn get_position_flags(&self) -> PositionFlags {
        self.status.flags()
    }

    pub fn config(&self) -> &LinearMotionConfig {
        &self.config
    }

    pub fn motor(&self) -> &E {
        &self.motor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::config::MechanicalConfig;
    use crate::motion::fixed_point::ONE_STEP;
    use heapless::spsc::Queue;

    #[derive(Default)]
    struct Enable {
        enabled: bool,
        toggles: u32,
    }

    impl MotorEnable for Enable {
        fn enable(&mut self) {
            self.enabled = true;
            self.toggles += 1;
        }
        fn disable(&mut self) {
            self.enabled = false;
            self.toggles += 1;
        }
    }

    /// 100 steps per mm, 0.1 steps per µm.
    fn axis() -> LinearMotionConfig {
        LinearMotionConfig {
            mech_config: MechanicalConfig::LeadScrew {
                lead_screw_pitch: 2.0,
            },
            steps_per_rev: 200.0,
            microstep: 1.0,
            gear_reduction_ratio: 1.0,
        }
    }

    #[test]
    fn linear_move_is_scaled_to_steps() {
        let mut q: Queue<Move, 4> = Queue::new();
        let status = PositionStatus::new();
        let (p, mut c) = q.split();
        let mut mc = MotionController::new(p, &status, axis(), MotionConstraints::default(), Enable::default());

        assert!(mc.move_linear(&AddLinearMoveRequest {
            group_id: 1,
            seq_id: 2,
            duration: 500,
            acceleration: 0,
            // Half a mm per tick.
            velocity: 1 << 30,
            request_stop_condition: 0,
        }));
        assert!(mc.is_enabled());
        assert!(mc.motor().enabled);

        let m = c.dequeue().unwrap();
        assert_eq!((m.group_id, m.seq_id, m.duration), (1, 2, 500));
        assert_eq!(m.velocity, 50 * ONE_STEP);
        assert_eq!(m.stop_condition, MoveStopCondition::NONE);
    }

    #[test]
    fn velocity_is_clamped() {
        let mut q: Queue<Move, 4> = Queue::new();
        let status = PositionStatus::new();
        let (p, mut c) = q.split();
        let constraints = MotionConstraints {
            max_velocity: 1 << 29,
            ..Default::default()
        };
        let mut mc = MotionController::new(p, &status, axis(), constraints, Enable::default());

        mc.home(&HomeRequest {
            group_id: 0,
            seq_id: 0,
            duration: 100,
            velocity: -(1 << 30),
        });
        let m = c.dequeue().unwrap();
        assert_eq!(m.velocity, -25 * ONE_STEP);
        assert_eq!(m.stop_condition, MoveStopCondition::LIMIT_SWITCH);
        assert_eq!(mc.get_motion_constraints(), constraints);
    }

    #[test]
    fn full_move_queue_drops() {
        let mut q: Queue<Move, 2> = Queue::new();
        let status = PositionStatus::new();
        let (p, _c) = q.split();
        let mut mc = MotionController::new(p, &status, axis(), MotionConstraints::default(), Enable::default());
        let m = AddLinearMoveRequest::default();
        assert!(mc.move_linear(&m));
        assert!(!mc.move_linear(&m));
    }

    #[test]
    fn stop_and_disable_update_status() {
        let mut q: Queue<Move, 2> = Queue::new();
        let status = PositionStatus::new();
        status.set_flags(PositionFlags::STEPPER_POSITION_OK);
        let (p, _c) = q.split();
        let mut mc = MotionController::new(p, &status, axis(), MotionConstraints::default(), Enable::default());

        mc.stop();
        assert!(status.take_cancel_request());

        mc.enable_motor();
        mc.disable_motor();
        assert!(!mc.is_enabled());
        assert_eq!(mc.motor().toggles, 2);
        assert!(!mc.get_position_flags().contains(PositionFlags::STEPPER_POSITION_OK));
    }

    #[test]
    fn position_is_reported_in_um() {
        let mut q: Queue<Move, 2> = Queue::new();
        let status = PositionStatus::new();
        let (p, _c) = q.split();
        let mc = MotionController::new(p, &status, axis(), MotionConstraints::default(), Enable::default());
        status.set_position(300);
        assert_eq!(mc.read_motor_position(), 3000);
    }
}
