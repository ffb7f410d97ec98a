// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Routing received frames to the code that handles them.
//!
//! A [`Dispatcher`] pairs a predicate over the arbitration id with a list of targets. When the
//! predicate holds, every target that accepts the frame's message id gets to parse and handle it.
//! Dispatchers are targets themselves, so one physical node can host several independently
//! addressed axes:
//!
//! ```ignore
//! let mut gripper = Dispatcher::new(
//!     |id: ArbitrationId| NodeId::Gripper.accepts(id.node_id_raw()) || id.node_id_raw() == 0x21,
//!     (
//!         Dispatcher::new(NodeFilter::new(NodeId::GripperZ), (z_moves, z_motion)),
//!         Dispatcher::new(NodeFilter::new(NodeId::GripperG), (g_moves,)),
//!     ),
//! );
//! ```

use core::marker::PhantomData;

use super::arbitration::ArbitrationId;
use super::ids::{MessageId, NodeId};
use super::parser::MessageSet;
use crate::logging::{debug, trace, warn};
use crate::queue::{MessageHandler, MessageQueue};

/// Something that can take frames from a dispatcher.
pub trait DispatchTarget {
    /// Whether this target handles `id` at all.
    fn accepts(&self, id: MessageId) -> bool;

    /// Parse and handle one frame. Only called for accepted ids.
    fn handle(&mut self, arbitration_id: ArbitrationId, payload: &[u8]);
}

/// Gate on the arbitration id applied before any target sees a frame.
pub trait DispatchPredicate {
    fn matches(&self, id: ArbitrationId) -> bool;
}

impl<F> DispatchPredicate for F
where
    F: Fn(ArbitrationId) -> bool,
{
    #[inline]
    fn matches(&self, id: ArbitrationId) -> bool {
        self(id)
    }
}

/// Matches frames for one node, its group alias, and broadcast.
#[derive(Debug, Clone, Copy)]
pub struct NodeFilter {
    node: NodeId,
}

impl NodeFilter {
    pub const fn new(node: NodeId) -> Self {
        Self { node }
    }
}

impl DispatchPredicate for NodeFilter {
    #[inline]
    fn matches(&self, id: ArbitrationId) -> bool {
        self.node.accepts(id.node_id_raw())
    }
}

/// Predicate-gated fan-out to an ordered tuple of targets.
pub struct Dispatcher<P, T> {
    predicate: P,
    targets: T,
}

impl<P, T> Dispatcher<P, T>
where
    P: DispatchPredicate,
    T: DispatchTarget,
{
    pub fn new(predicate: P, targets: T) -> Self {
        Self { predicate, targets }
    }

    /// Feed one received frame through the tree.
    pub fn handle_frame(&mut self, arbitration_id: ArbitrationId, payload: &[u8]) {
        if !self.predicate.matches(arbitration_id) {
            return;
        }
        match arbitration_id.message_id() {
            Ok(id) if self.targets.accepts(id) => self.targets.handle(arbitration_id, payload),
            Ok(id) => trace!("no target for {:?}", id),
            Err(_) => trace!("unknown message id {}", arbitration_id.message_id_raw()),
        }
    }

    pub fn targets(&self) -> &T {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut T {
        &mut self.targets
    }
}

impl<P, T> DispatchTarget for Dispatcher<P, T>
where
    P: DispatchPredicate,
    T: DispatchTarget,
{
    fn accepts(&self, id: MessageId) -> bool {
        self.targets.accepts(id)
    }

    fn handle(&mut self, arbitration_id: ArbitrationId, payload: &[u8]) {
        self.handle_frame(arbitration_id, payload);
    }
}

impl<D: DispatchTarget + ?Sized> DispatchTarget for &mut D {
    fn accepts(&self, id: MessageId) -> bool {
        (**self).accepts(id)
    }

    fn handle(&mut self, arbitration_id: ArbitrationId, payload: &[u8]) {
        (**self).handle(arbitration_id, payload)
    }
}

macro_rules! tuple_targets {
    ($($t:ident . $idx:tt),+) => {
        impl<$($t: DispatchTarget),+> DispatchTarget for ($($t,)+) {
            fn accepts(&self, id: MessageId) -> bool {
                false $( || self.$idx.accepts(id) )+
            }

            fn handle(&mut self, arbitration_id: ArbitrationId, payload: &[u8]) {
                let Ok(id) = arbitration_id.message_id() else {
                    return;
                };
                $(
                    if self.$idx.accepts(id) {
                        self.$idx.handle(arbitration_id, payload);
                    }
                )+
            }
        }
    };
}

tuple_targets!(A.0);
tuple_targets!(A.0, B.1);
tuple_targets!(A.0, B.1, C.2);
tuple_targets!(A.0, B.1, C.2, D.3);
tuple_targets!(A.0, B.1, C.2, D.3, E.4);
tuple_targets!(A.0, B.1, C.2, D.3, E.4, F.5);
tuple_targets!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
tuple_targets!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);

/// Parses a message set and pushes it onto a task queue.
///
/// `S` is the set parsed off the bus and `M` the queue's message type; the two differ when a
/// task also receives messages from other tasks.
pub struct DispatchQueueTarget<'a, S, M, Q: ?Sized> {
    queue: &'a Q,
    _types: PhantomData<fn(S) -> M>,
}

impl<'a, S, M, Q> DispatchQueueTarget<'a, S, M, Q>
where
    S: MessageSet,
    M: From<S>,
    Q: MessageQueue<M> + ?Sized,
{
    pub fn new(queue: &'a Q) -> Self {
        Self {
            queue,
            _types: PhantomData,
        }
    }
}

impl<'a, S, M, Q> DispatchTarget for DispatchQueueTarget<'a, S, M, Q>
where
    S: MessageSet,
    M: From<S>,
    Q: MessageQueue<M> + ?Sized,
{
    fn accepts(&self, id: MessageId) -> bool {
        S::accepts(id)
    }

    fn handle(&mut self, arbitration_id: ArbitrationId, payload: &[u8]) {
        let Ok(id) = arbitration_id.message_id() else {
            return;
        };
        match S::parse(id, payload) {
            Some(message) => {
                if self.queue.try_write(M::from(message)).is_err() {
                    warn!("task queue full, dropping {:?}", id);
                }
            }
            None => debug!("could not parse {:?} ({} bytes)", id, payload.len()),
        }
    }
}

/// Parses a message set and hands it straight to a handler in the receiving context.
pub struct DispatchParseTarget<S, H> {
    handler: H,
    _set: PhantomData<fn() -> S>,
}

impl<S, H> DispatchParseTarget<S, H>
where
    S: MessageSet,
    H: MessageHandler<S>,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _set: PhantomData,
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<S, H> DispatchTarget for DispatchParseTarget<S, H>
where
    S: MessageSet,
    H: MessageHandler<S>,
{
    fn accepts(&self, id: MessageId) -> bool {
        S::accepts(id)
    }

    fn handle(&mut self, arbitration_id: ArbitrationId, payload: &[u8]) {
        let Ok(id) = arbitration_id.message_id() else {
            return;
        };
        match S::parse(id, payload) {
            Some(message) => self.handler.handle_message(message),
            None => debug!("could not parse {:?} ({} bytes)", id, payload.len()),
        }
    }
}
