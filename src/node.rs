// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Assembly root for one motor node.
//!
//! [`NodeResources`] holds every queue and the shared position status, and can live in a
//! `static`. [`MotorNode::new`] borrows it, builds the dispatcher and the tasks, and hands back
//! the [`PulseGenerator`] for the timer interrupt:
//!
//! ```ignore
//! let resources = cortex_m::singleton!(: NodeResources = NodeResources::new()).unwrap();
//! let (mut node, pulse) = MotorNode::new(resources, parts);
//! // move `pulse` into the timer interrupt
//! loop {
//!     if let Some(frame) = bus.receive() {
//!         node.handle_frame(frame.id, &frame.data);
//!     }
//!     node.poll(&mut bus);
//! }
//! ```

use heapless::spsc::Queue;

use crate::can::dispatch::{DispatchParseTarget, DispatchQueueTarget, Dispatcher, NodeFilter};
use crate::can::system::{SystemMessage, SystemMessageHandler};
use crate::can::writer::{CanWriterQueue, CanWriterTask, MessageWriter};
use crate::can::{ArbitrationId, CanBus, Error};
use crate::drivers::tmc2130::{RegisterAccess, Tmc2130};
use crate::logging::info;
use crate::motion::config::{LinearMotionConfig, MotionConstraints, NodeConfig};
use crate::motion::controller::{MotionController, MotorEnable};
use crate::motion::moves::{Ack, Move};
use crate::motion::position::PositionStatus;
use crate::motion::pulse::{PulseGenerator, StepperHardware};
use crate::tasks::motion_controller::{
    MotionControlRequest, MotionControllerMessageHandler, MotionControllerQueue,
    MotionControllerTaskMessage,
};
use crate::tasks::motor_driver::{MotorDriverMessageHandler, MotorDriverQueue, MotorDriverRequest};
use crate::tasks::move_group::{MoveGroupMessageHandler, MoveGroupQueue, MoveGroupRequest};
use crate::tasks::move_status::MoveStatusReporterTask;
use crate::tasks::{Task, TASK_QUEUE_DEPTH};

/// Slots in the interrupt move queue.
pub const MOVE_QUEUE_DEPTH: usize = 16;

/// Slots in the interrupt ack queue.
pub const ACK_QUEUE_DEPTH: usize = 16;

/// Depth of the outgoing frame queue.
pub const CAN_WRITER_QUEUE_DEPTH: usize = 16;

type Writer<'a> = MessageWriter<'a, CAN_WRITER_QUEUE_DEPTH>;

/// Every queue a node uses, plus the status shared with the interrupt.
pub struct NodeResources {
    pub can_writer: CanWriterQueue<CAN_WRITER_QUEUE_DEPTH>,
    pub move_group: MoveGroupQueue<TASK_QUEUE_DEPTH>,
    pub motion_controller: MotionControllerQueue<TASK_QUEUE_DEPTH>,
    pub motor_driver: MotorDriverQueue<TASK_QUEUE_DEPTH>,
    moves: Queue<Move, MOVE_QUEUE_DEPTH>,
    acks: Queue<Ack, ACK_QUEUE_DEPTH>,
    pub status: PositionStatus,
}

impl NodeResources {
    pub const fn new() -> Self {
        Self {
            can_writer: CanWriterQueue::new(),
            move_group: MoveGroupQueue::new(),
            motion_controller: MotionControllerQueue::new(),
            motor_driver: MotorDriverQueue::new(),
            moves: Queue::new(),
            acks: Queue::new(),
            status: PositionStatus::new(),
        }
    }
}

impl Default for NodeResources {
    fn default() -> Self {
        Self::new()
    }
}

/// Board-specific pieces a node is built from.
pub struct NodeParts<E, R, H> {
    pub config: NodeConfig,
    pub axis: LinearMotionConfig,
    pub constraints: MotionConstraints,
    pub motor: E,
    pub driver: Tmc2130<R>,
    pub stepper: H,
}

/// Dispatch tree for a single-axis node.
pub type NodeDispatcher<'a> = Dispatcher<
    NodeFilter,
    (
        DispatchParseTarget<SystemMessage, SystemMessageHandler<'a, CAN_WRITER_QUEUE_DEPTH>>,
        DispatchQueueTarget<'a, MoveGroupRequest, MoveGroupRequest, MoveGroupQueue<TASK_QUEUE_DEPTH>>,
        DispatchQueueTarget<
            'a,
            MotionControlRequest,
            MotionControllerTaskMessage,
            MotionControllerQueue<TASK_QUEUE_DEPTH>,
        >,
        DispatchQueueTarget<'a, MotorDriverRequest, MotorDriverRequest, MotorDriverQueue<TASK_QUEUE_DEPTH>>,
    ),
>;

type MoveGroupTask<'a> = Task<
    'a,
    MoveGroupRequest,
    MoveGroupMessageHandler<'a, MotionControllerQueue<TASK_QUEUE_DEPTH>, CAN_WRITER_QUEUE_DEPTH>,
    TASK_QUEUE_DEPTH,
>;

type MotionControllerTask<'a, E> = Task<
    'a,
    MotionControllerTaskMessage,
    MotionControllerMessageHandler<'a, E, MOVE_QUEUE_DEPTH, CAN_WRITER_QUEUE_DEPTH>,
    TASK_QUEUE_DEPTH,
>;

type MotorDriverTask<'a, R> =
    Task<'a, MotorDriverRequest, MotorDriverMessageHandler<'a, R, CAN_WRITER_QUEUE_DEPTH>, TASK_QUEUE_DEPTH>;

/// The interrupt half of a node.
pub type NodePulseGenerator<'a, H> = PulseGenerator<'a, H, MOVE_QUEUE_DEPTH, ACK_QUEUE_DEPTH>;

/// The task half of a node.
pub struct MotorNode<'a, E, R> {
    config: NodeConfig,
    dispatcher: NodeDispatcher<'a>,
    move_group: MoveGroupTask<'a>,
    motion_controller: MotionControllerTask<'a, E>,
    motor_driver: MotorDriverTask<'a, R>,
    move_status: MoveStatusReporterTask<'a, ACK_QUEUE_DEPTH, CAN_WRITER_QUEUE_DEPTH>,
    can_writer: CanWriterTask<'a, CAN_WRITER_QUEUE_DEPTH>,
    status: &'a PositionStatus,
}

impl<'a, E, R> MotorNode<'a, E, R>
where
    E: MotorEnable,
    R: RegisterAccess,
{
    /// Wire up a node. The pulse generator must be driven from the step timer interrupt.
    pub fn new<H: StepperHardware>(
        resources: &'a mut NodeResources,
        parts: NodeParts<E, R, H>,
    ) -> (Self, NodePulseGenerator<'a, H>) {
        let NodeResources {
            can_writer,
            move_group,
            motion_controller,
            motor_driver,
            moves,
            acks,
            status,
        } = resources;
        let can_writer: &'a CanWriterQueue<CAN_WRITER_QUEUE_DEPTH> = can_writer;
        let move_group: &'a MoveGroupQueue<TASK_QUEUE_DEPTH> = move_group;
        let motion_controller: &'a MotionControllerQueue<TASK_QUEUE_DEPTH> = motion_controller;
        let motor_driver: &'a MotorDriverQueue<TASK_QUEUE_DEPTH> = motor_driver;
        let status: &'a PositionStatus = status;

        let (move_tx, move_rx) = moves.split();
        let (ack_tx, ack_rx) = acks.split();

        let NodeParts {
            config,
            axis,
            constraints,
            motor,
            driver,
            stepper,
        } = parts;
        let writer: Writer<'a> = MessageWriter::new(can_writer);

        let dispatcher = Dispatcher::new(
            NodeFilter::new(config.node_id),
            (
                DispatchParseTarget::new(SystemMessageHandler::new(writer, config.host, config.version)),
                DispatchQueueTarget::new(move_group),
                DispatchQueueTarget::new(motion_controller),
                DispatchQueueTarget::new(motor_driver),
            ),
        );

        let controller = MotionController::new(move_tx, status, axis, constraints, motor);
        let node = Self {
            config,
            dispatcher,
            move_group: Task::new(
                move_group,
                MoveGroupMessageHandler::new(motion_controller, writer, config.host),
            ),
            motion_controller: Task::new(
                motion_controller,
                MotionControllerMessageHandler::new(controller, writer, config.host),
            ),
            motor_driver: Task::new(
                motor_driver,
                MotorDriverMessageHandler::new(driver, writer, config.host),
            ),
            move_status: MoveStatusReporterTask::new(ack_rx, status, writer, config.host),
            can_writer: CanWriterTask::new(can_writer),
            status,
        };
        let pulse = PulseGenerator::new(move_rx, ack_tx, status, stepper);
        info!("node {:?} ready", config.node_id);
        (node, pulse)
    }

    /// Install this node's acceptance filters on `bus`.
    pub fn setup_filters<B: CanBus + ?Sized>(&self, bus: &mut B) -> Result<(), Error> {
        bus.setup_node_id_filter(self.config.node_id)
    }

    /// Route one received frame.
    pub fn handle_frame(&mut self, arbitration_id: ArbitrationId, payload: &[u8]) {
        self.dispatcher.handle_frame(arbitration_id, payload);
    }

    /// Give every task one turn, highest priority first, then send at most one frame. Returns
    /// `true` if anything ran.
    pub fn poll<B: CanBus + ?Sized>(&mut self, bus: &mut B) -> bool {
        let mut busy = self.move_status.run_once();
        busy |= self.motion_controller.run_once();
        busy |= self.move_group.run_once();
        busy |= self.motor_driver.run_once();
        busy |= self.can_writer.run_once(bus);
        busy
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn status(&self) -> &'a PositionStatus {
        self.status
    }
}
