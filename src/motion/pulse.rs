// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Step pulse generator.
//!
//! [`PulseGenerator::run_interrupt`] is called once per timer tick from the highest-priority
//! interrupt. Each tick it may pull a move off its queue, advance the `q31.31` position by the
//! move's velocity, and pulse the step line when the position crosses a whole step.
//!
//! The generator owns the consumer end of the move queue and the producer end of the ack queue,
//! both lock-free. Everything else it shares goes through [`PositionStatus`] atomics. It never
//! logs and never blocks; problems are reported through status flags instead.

use heapless::spsc::{Consumer, Producer};

use super::fixed_point::{whole_steps, Q31_31, ONE_STEP, RADIX};
use super::moves::{Ack, AckMessageId, Move, MoveStopCondition};
use super::position::{PositionFlags, PositionStatus};

/// Highest representable position: `u32::MAX` whole steps plus a full fraction.
pub const MAX_POSITION: Q31_31 = ((u32::MAX as i64) << RADIX) | (ONE_STEP - 1);

/// Whole steps of a position already known to be in `0..=MAX_POSITION`.
#[inline]
fn status_steps(position: Q31_31) -> u32 {
    u32::try_from(whole_steps(position)).unwrap_or(u32::MAX)
}

/// Pins and inputs the generator drives.
pub trait StepperHardware {
    /// Raise the step line.
    fn step(&mut self);
    /// Lower the step line.
    fn unstep(&mut self);
    fn positive_direction(&mut self);
    fn negative_direction(&mut self);
    /// `true` while the home limit switch is pressed.
    fn check_limit_switch(&mut self) -> bool;
    /// Quadrature count, for axes with an encoder.
    fn encoder_position(&mut self) -> Option<i32> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseState {
    /// No move loaded.
    Idle,
    /// Working through the active move's tick budget.
    Stepping,
    /// The last move just finished and nothing was queued behind it.
    MoveComplete,
    /// Position overflowed. No stepping until the axis is cancelled.
    Halted,
}

#[derive(Debug, Clone, Copy)]
struct ActiveMove {
    request: Move,
    velocity: Q31_31,
    tick_count: u32,
    target: Q31_31,
}

pub struct PulseGenerator<'a, H, const M: usize, const A: usize> {
    moves: Consumer<'a, Move, M>,
    acks: Producer<'a, Ack, A>,
    status: &'a PositionStatus,
    hardware: H,
    state: PulseState,
    active: Option<ActiveMove>,
    position: Q31_31,
}

impl<'a, H, const M: usize, const A: usize> PulseGenerator<'a, H, M, A>
where
    H: StepperHardware,
{
    pub fn new(
        moves: Consumer<'a, Move, M>,
        acks: Producer<'a, Ack, A>,
        status: &'a PositionStatus,
        mut hardware: H,
    ) -> Self {
        hardware.unstep();
        status.set_position(0);
        Self {
            moves,
            acks,
            status,
            hardware,
            state: PulseState::Idle,
            active: None,
            position: 0,
        }
    }

    /// Timer interrupt entry point.
    pub fn run_interrupt(&mut self) {
        let limit_switch = self.hardware.check_limit_switch();
        self.status.set_limit_switch(limit_switch);

        if self.status.take_cancel_request() {
            self.cancel();
            return;
        }
        if self.state == PulseState::Halted {
            return;
        }

        if self.pulse(limit_switch) {
            if self.active.map_or(true, |a| a.velocity >= 0) {
                self.hardware.positive_direction();
            } else {
                self.hardware.negative_direction();
            }
            self.hardware.step();
            self.hardware.unstep();
        }

        if let Some(pulses) = self.hardware.encoder_position() {
            self.status.set_encoder_position(pulses);
        }
    }

    /// Decide whether this tick emits a step.
    fn pulse(&mut self, limit_switch: bool) -> bool {
        if self.active.is_none() {
            if self.has_messages() {
                self.update_move();
            } else if self.state == PulseState::MoveComplete {
                self.state = PulseState::Idle;
            }
            return false;
        }

        if self.stop_condition_met(limit_switch) {
            return false;
        }
        if self.can_step() {
            return self.tick();
        }

        let ack = match self.active {
            Some(a) if a.request.stop_condition.contains(MoveStopCondition::LIMIT_SWITCH) => {
                AckMessageId::Timeout
            }
            _ => AckMessageId::CompleteWithoutCondition,
        };
        self.finish_current_move(ack);
        if self.has_messages() {
            self.update_move();
            if self.can_step() {
                return self.tick();
            }
        }
        false
    }

    fn stop_condition_met(&mut self, limit_switch: bool) -> bool {
        let homing = self
            .active
            .map_or(false, |a| a.request.stop_condition.contains(MoveStopCondition::LIMIT_SWITCH));
        if homing && limit_switch {
            self.position = 0;
            self.status.set_position(0);
            self.status.set_flags(PositionFlags::STEPPER_POSITION_OK);
            self.finish_current_move(AckMessageId::StoppedByCondition);
            return true;
        }
        false
    }

    /// `true` while the active move still has ticks left.
    pub fn can_step(&self) -> bool {
        self.active.map_or(false, |a| a.tick_count < a.request.duration)
    }

    /// Advance the active move by one tick. Returns `true` if the position crossed a whole step.
    ///
    /// A position leaving `0..=MAX_POSITION` halts the axis and keeps the last valid position.
    pub fn tick(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        active.tick_count += 1;

        let next = active
            .velocity
            .checked_add(active.request.acceleration)
            .and_then(|v| self.position.checked_add(v).map(|p| (v, p)))
            .filter(|&(_, p)| (0..=MAX_POSITION).contains(&p));
        let Some((velocity, position)) = next else {
            self.halt();
            return false;
        };
        active.velocity = velocity;

        let old = self.position;
        self.position = position;
        self.status.set_position(status_steps(position));
        (old ^ position) & ONE_STEP != 0
    }

    /// `true` if a move is waiting behind the active one.
    pub fn has_messages(&self) -> bool {
        self.moves.ready()
    }

    /// Load the next queued move as the active one. Does nothing if the queue is empty.
    ///
    /// Homing from an unknown position starts at the top of the range so the whole travel
    /// towards the switch stays representable.
    pub fn update_move(&mut self) {
        let Some(request) = self.moves.dequeue() else {
            return;
        };
        if request.stop_condition.contains(MoveStopCondition::LIMIT_SWITCH)
            && !self.status.flags().contains(PositionFlags::STEPPER_POSITION_OK)
        {
            self.set_position(MAX_POSITION);
        }
        self.active = Some(ActiveMove {
            request,
            velocity: request.velocity,
            tick_count: 0,
            target: 0,
        });
        match request.target_from(self.position) {
            Some(target) => {
                if let Some(a) = self.active.as_mut() {
                    a.target = target;
                }
                self.state = PulseState::Stepping;
            }
            None => self.halt(),
        }
    }

    /// Retire the active move and report it.
    pub fn finish_current_move(&mut self, ack_id: AckMessageId) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.state = PulseState::MoveComplete;
        self.notify(&active.request, ack_id);
    }

    fn notify(&mut self, request: &Move, ack_id: AckMessageId) {
        let ack = Ack {
            group_id: request.group_id,
            seq_id: request.seq_id,
            current_position: self.status.position(),
            encoder_position: self.status.encoder_position(),
            position_flags: self.status.flags().bits(),
            ack_id,
        };
        if self.acks.enqueue(ack).is_err() {
            self.status.set_flags(PositionFlags::NOTIFICATION_DROPPED);
        }
    }

    /// Stop stepping after an overflow. The position is left at its last valid value.
    fn halt(&mut self) {
        self.state = PulseState::Halted;
        self.status.clear_flags(PositionFlags::STEPPER_POSITION_OK);
        self.status.set_flags(PositionFlags::POSITION_OVERFLOW);
        if let Some(active) = self.active.take() {
            self.notify(&active.request, AckMessageId::PositionError);
        }
    }

    /// Drop the active move and everything queued behind it.
    fn cancel(&mut self) {
        self.active = None;
        while self.moves.dequeue().is_some() {}
        self.status.clear_flags(PositionFlags::POSITION_OVERFLOW);
        self.state = PulseState::Idle;
    }

    pub fn state(&self) -> PulseState {
        self.state
    }

    /// Current position, `q31.31`.
    pub fn position(&self) -> Q31_31 {
        self.position
    }

    /// Overwrite the position, clamped to `0..=MAX_POSITION`.
    pub fn set_position(&mut self, position: Q31_31) {
        self.position = position.clamp(0, MAX_POSITION);
        self.status.set_position(status_steps(self.position));
    }

    /// Final position of the active move, if one is loaded.
    pub fn target_position(&self) -> Option<Q31_31> {
        self.active.map(|a| a.target)
    }

    /// Velocity the active move is currently running at, `q31.31` steps per tick.
    pub fn velocity(&self) -> Option<Q31_31> {
        self.active.map(|a| a.velocity)
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::spsc::Queue;

    #[derive(Default)]
    struct Pins {
        steps: u32,
        forward: bool,
        limit: bool,
    }

    impl StepperHardware for Pins {
        fn step(&mut self) {
            self.steps += 1;
        }
        fn unstep(&mut self) {}
        fn positive_direction(&mut self) {
            self.forward = true;
        }
        fn negative_direction(&mut self) {
            self.forward = false;
        }
        fn check_limit_switch(&mut self) -> bool {
            self.limit
        }
    }

    fn linear(seq_id: u8, duration: u32, velocity: Q31_31) -> Move {
        Move {
            group_id: 0,
            seq_id,
            duration,
            velocity,
            ..Default::default()
        }
    }

    #[test]
    fn idle_tick_is_legal() {
        let mut moves: Queue<Move, 4> = Queue::new();
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let (_, c) = moves.split();
        let (p, mut ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());

        for _ in 0..10 {
            gen.run_interrupt();
        }
        assert_eq!(gen.state(), PulseState::Idle);
        assert!(!gen.can_step());
        assert!(!gen.has_messages());
        assert!(!gen.tick());
        assert!(ack_rx.dequeue().is_none());
    }

    #[test]
    fn moves_run_back_to_back() {
        let mut moves: Queue<Move, 4> = Queue::new();
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let (mut tx, c) = moves.split();
        let (p, mut ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());

        tx.enqueue(linear(0, 4, ONE_STEP / 2)).unwrap();
        tx.enqueue(linear(1, 2, ONE_STEP)).unwrap();

        // Load, then four ticks at half a step.
        for _ in 0..5 {
            gen.run_interrupt();
        }
        assert_eq!(gen.hardware().steps, 2);
        assert_eq!(gen.position(), 2 * ONE_STEP);

        // First move retires and the second starts in the same tick.
        gen.run_interrupt();
        let ack = ack_rx.dequeue().unwrap();
        assert_eq!((ack.seq_id, ack.ack_id), (0, AckMessageId::CompleteWithoutCondition));
        assert_eq!(ack.current_position, 2);
        assert_eq!(gen.hardware().steps, 3);

        gen.run_interrupt();
        gen.run_interrupt();
        assert_eq!(gen.state(), PulseState::MoveComplete);
        assert_eq!(ack_rx.dequeue().map(|a| a.seq_id), Some(1));
        assert_eq!(status.position(), 4);

        gen.run_interrupt();
        assert_eq!(gen.state(), PulseState::Idle);
    }

    #[test]
    fn negative_velocity_sets_direction() {
        let mut moves: Queue<Move, 4> = Queue::new();
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let (mut tx, c) = moves.split();
        let (p, _ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());
        gen.set_position(10 * ONE_STEP);

        tx.enqueue(linear(0, 3, -ONE_STEP)).unwrap();
        for _ in 0..4 {
            gen.run_interrupt();
        }
        assert!(!gen.hardware().forward);
        assert_eq!(gen.hardware().steps, 3);
        assert_eq!(status.position(), 7);
    }

    #[test]
    fn overflow_halts_axis() {
        let mut moves: Queue<Move, 4> = Queue::new();
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        status.set_flags(PositionFlags::STEPPER_POSITION_OK);
        let (mut tx, c) = moves.split();
        let (p, mut ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());
        gen.set_position(i64::MAX - ONE_STEP);

        // The end of this move is already out of range, so loading it halts.
        tx.enqueue(linear(0, 4, ONE_STEP)).unwrap();
        gen.run_interrupt();
        assert_eq!(gen.state(), PulseState::Halted);
        assert!(status.flags().contains(PositionFlags::POSITION_OVERFLOW));
        assert!(!status.flags().contains(PositionFlags::STEPPER_POSITION_OK));
        assert_eq!(ack_rx.dequeue().map(|a| a.ack_id), Some(AckMessageId::PositionError));

        tx.enqueue(linear(1, 4, ONE_STEP)).unwrap();
        for _ in 0..10 {
            gen.run_interrupt();
        }
        assert_eq!(gen.state(), PulseState::Halted);
        assert_eq!(gen.hardware().steps, 0);
    }

    #[test]
    fn negative_travel_overflows() {
        let mut moves: Queue<Move, 4> = Queue::new();
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        status.set_flags(PositionFlags::STEPPER_POSITION_OK);
        let (mut tx, c) = moves.split();
        let (p, mut ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());
        gen.set_position(2 * ONE_STEP);

        tx.enqueue(linear(0, 10, -ONE_STEP)).unwrap();
        for _ in 0..20 {
            gen.run_interrupt();
        }
        assert_eq!(gen.state(), PulseState::Halted);
        assert_eq!(gen.position(), 0);
        assert_eq!(status.position(), 0);
        assert!(status.flags().contains(PositionFlags::POSITION_OVERFLOW));
        assert!(!status.flags().contains(PositionFlags::STEPPER_POSITION_OK));
        let ack = ack_rx.dequeue().unwrap();
        assert_eq!((ack.ack_id, ack.current_position), (AckMessageId::PositionError, 0));
        assert!(ack_rx.dequeue().is_none());
        assert_eq!(gen.hardware().steps, 2);
    }

    #[test]
    fn set_position_clamps_to_range() {
        let mut moves: Queue<Move, 4> = Queue::new();
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let (_, c) = moves.split();
        let (p, _ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());

        gen.set_position(-ONE_STEP);
        assert_eq!((gen.position(), status.position()), (0, 0));
        gen.set_position(MAX_POSITION);
        assert_eq!(status.position(), u32::MAX);
    }

    #[test]
    fn cancel_drains_queue_and_recovers_from_halt() {
        let mut moves: Queue<Move, 4> = Queue::new();
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let (mut tx, c) = moves.split();
        let (p, mut ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());

        tx.enqueue(linear(0, 100, ONE_STEP)).unwrap();
        tx.enqueue(linear(1, 100, ONE_STEP)).unwrap();
        tx.enqueue(linear(2, 100, ONE_STEP)).unwrap();
        for _ in 0..10 {
            gen.run_interrupt();
        }
        assert_eq!(gen.state(), PulseState::Stepping);

        status.request_cancel();
        gen.run_interrupt();
        assert_eq!(gen.state(), PulseState::Idle);
        assert!(!gen.has_messages());
        assert!(!gen.can_step());
        assert!(ack_rx.dequeue().is_none());

        let steps = gen.hardware().steps;
        for _ in 0..10 {
            gen.run_interrupt();
        }
        assert_eq!(gen.hardware().steps, steps);
    }

    #[test]
    fn homing_stops_on_limit_switch() {
        let mut moves: Queue<Move, 4> = Queue::new();
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let (mut tx, c) = moves.split();
        let (p, mut ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());
        status.set_flags(PositionFlags::STEPPER_POSITION_OK);
        gen.set_position(50 * ONE_STEP);

        tx.enqueue(Move {
            group_id: 1,
            seq_id: 0,
            duration: 1000,
            velocity: -ONE_STEP,
            stop_condition: MoveStopCondition::LIMIT_SWITCH,
            ..Default::default()
        })
        .unwrap();
        for _ in 0..6 {
            gen.run_interrupt();
        }
        assert_eq!(status.position(), 45);

        gen.hardware_mut().limit = true;
        gen.run_interrupt();
        assert!(status.limit_switch());
        assert_eq!(gen.position(), 0);
        assert!(status.flags().contains(PositionFlags::STEPPER_POSITION_OK));
        let ack = ack_rx.dequeue().unwrap();
        assert_eq!(ack.ack_id, AckMessageId::StoppedByCondition);
        assert_eq!((ack.group_id, ack.current_position), (1, 0));
    }

    #[test]
    fn homing_from_unknown_position_starts_at_top() {
        let mut moves: Queue<Move, 4> = Queue::new();
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let (mut tx, c) = moves.split();
        let (p, mut ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());

        tx.enqueue(Move {
            duration: 1000,
            velocity: -ONE_STEP,
            stop_condition: MoveStopCondition::LIMIT_SWITCH,
            ..Default::default()
        })
        .unwrap();
        for _ in 0..4 {
            gen.run_interrupt();
        }
        assert_eq!(gen.state(), PulseState::Stepping);
        assert_eq!(status.position(), u32::MAX - 3);
        assert!(!status.flags().contains(PositionFlags::POSITION_OVERFLOW));

        gen.hardware_mut().limit = true;
        gen.run_interrupt();
        assert_eq!((gen.position(), status.position()), (0, 0));
        assert_eq!(ack_rx.dequeue().map(|a| a.ack_id), Some(AckMessageId::StoppedByCondition));
    }

    #[test]
    fn homing_without_switch_times_out() {
        let mut moves: Queue<Move, 4> = Queue::new();
        let mut acks: Queue<Ack, 4> = Queue::new();
        let status = PositionStatus::new();
        let (mut tx, c) = moves.split();
        let (p, mut ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());
        gen.set_position(50 * ONE_STEP);

        tx.enqueue(Move {
            duration: 3,
            velocity: -ONE_STEP,
            stop_condition: MoveStopCondition::LIMIT_SWITCH,
            ..Default::default()
        })
        .unwrap();
        for _ in 0..5 {
            gen.run_interrupt();
        }
        assert_eq!(ack_rx.dequeue().map(|a| a.ack_id), Some(AckMessageId::Timeout));
        assert!(!status.flags().contains(PositionFlags::STEPPER_POSITION_OK));
    }

    #[test]
    fn full_ack_queue_sets_dropped_flag() {
        let mut moves: Queue<Move, 4> = Queue::new();
        // Capacity of one.
        let mut acks: Queue<Ack, 2> = Queue::new();
        let status = PositionStatus::new();
        let (mut tx, c) = moves.split();
        let (p, _ack_rx) = acks.split();
        let mut gen = PulseGenerator::new(c, p, &status, Pins::default());

        tx.enqueue(linear(0, 1, ONE_STEP)).unwrap();
        tx.enqueue(linear(1, 1, ONE_STEP)).unwrap();
        for _ in 0..6 {
            gen.run_interrupt();
        }
        assert!(status.flags().contains(PositionFlags::NOTIFICATION_DROPPED));
    }
}
