// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Acceptance filters and the bus seam.
//!
//! `FilterConfig` and `FilterType` carry the FDCAN register values used by STM32 parts, so a
//! peripheral adapter can write them straight through.

use super::arbitration::{self, ArbitrationId, NODE_ID_FILTER_MASK};
use super::dlc::Dlc;
use super::ids::NodeId;
use super::Error;
use crate::logging::debug;

/// What the peripheral does with a frame that matches a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterConfig {
    Disabled,
    ToFifo0,
    ToFifo1,
    Reject,
    ToFifo0HighPriority,
    ToFifo1HighPriority,
}

impl FilterConfig {
    /// Register value for this action.
    pub const fn raw(self) -> u8 {
        match self {
            FilterConfig::Disabled => 0,
            FilterConfig::ToFifo0 => 1,
            FilterConfig::ToFifo1 => 2,
            FilterConfig::Reject => 3,
            FilterConfig::ToFifo0HighPriority => 5,
            FilterConfig::ToFifo1HighPriority => 6,
        }
    }
}

impl From<u8> for FilterConfig {
    fn from(raw: u8) -> Self {
        match raw {
            1 => FilterConfig::ToFifo0,
            2 => FilterConfig::ToFifo1,
            3 => FilterConfig::Reject,
            5 => FilterConfig::ToFifo0HighPriority,
            6 => FilterConfig::ToFifo1HighPriority,
            _ => FilterConfig::Disabled,
        }
    }
}

/// How a filter's two words are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterType {
    /// Accept ids in `[first, second]`.
    Range,
    /// Accept exactly `first` or `second`.
    Exact,
    /// Accept ids where `id & second == first & second`.
    Mask,
}

impl FilterType {
    pub const fn raw(self) -> u8 {
        match self {
            FilterType::Range => 0,
            FilterType::Exact => 1,
            FilterType::Mask => 2,
        }
    }
}

impl From<u8> for FilterType {
    fn from(raw: u8) -> Self {
        match raw {
            1 => FilterType::Exact,
            2 => FilterType::Mask,
            _ => FilterType::Range,
        }
    }
}

/// A CAN peripheral, as seen by the protocol layer.
pub trait CanBus {
    /// Install one acceptance filter.
    fn add_filter(
        &mut self,
        kind: FilterType,
        config: FilterConfig,
        first: u32,
        second: u32,
    ) -> Result<(), Error>;

    /// Queue one frame for transmission. `payload` is at most `dlc.len()` bytes and the adapter
    /// pads the remainder with zeros.
    fn send(&mut self, id: ArbitrationId, payload: &[u8], dlc: Dlc) -> Result<(), Error>;

    /// Accept frames for `node`, for broadcast, and for the node's group, then reject the rest.
    fn setup_node_id_filter(&mut self, node: NodeId) -> Result<(), Error> {
        debug!("installing node filters for {:?}", node);
        let node_filter = |n: NodeId| arbitration::pack(n.raw(), 0, 0);

        self.add_filter(
            FilterType::Mask,
            FilterConfig::ToFifo0,
            node_filter(node),
            NODE_ID_FILTER_MASK,
        )?;
        self.add_filter(
            FilterType::Mask,
            FilterConfig::ToFifo0,
            node_filter(NodeId::Broadcast),
            NODE_ID_FILTER_MASK,
        )?;
        if let Some(group) = node.group_alias() {
            self.add_filter(
                FilterType::Mask,
                FilterConfig::ToFifo0,
                node_filter(group),
                NODE_ID_FILTER_MASK,
            )?;
        }
        self.add_filter(FilterType::Mask, FilterConfig::Reject, 0, 0)
    }
}
