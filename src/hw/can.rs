// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Controller Area Network (CAN) abstraction layer.
//!
//! - `FdCanBus` wraps an `fdcan::FdCan` instance built by the HAL and implements the protocol
//!   layer's [`CanBus`] seam.
//! - Frames are CAN-FD without bit rate switching, up to 64 data bytes, always with 29-bit
//!   extended ids.
//! - Filters can only be written while the peripheral is in configuration mode, so the adapter is
//!   type-stated: install filters on `FdCanBus<I, ConfigMode>`, then [`FdCanBus::start`].

use fdcan::config::{FrameTransmissionConfig, GlobalFilter, NominalBitTiming, NonMatchingFilter};
use fdcan::filter::{Action, ExtendedFilter, ExtendedFilterSlot, FilterType as FdFilterType};
use fdcan::frame::{FrameFormat, TxFrameHeader};
use fdcan::id::{ExtendedId, Id};
use fdcan::{ConfigMode, FdCan, Instance, NormalOperationMode, ReceiveOverrun};
use nb::block;

use crate::can::dlc::{Dlc, MAX_PAYLOAD};
use crate::can::filter::{FilterConfig, FilterType};
use crate::can::{ArbitrationId, CanBus, Error};
use crate::logging::warn;

/// A received frame.
#[derive(Debug, Clone)]
pub struct Received {
    pub id: ArbitrationId,
    pub data: heapless::Vec<u8, MAX_PAYLOAD>,
}

/// FDCAN adapter. `M` is the peripheral's operating mode.
pub struct FdCanBus<I: Instance, M> {
    can: FdCan<I, M>,
    next_slot: u8,
}

impl<I: Instance> FdCanBus<I, ConfigMode> {
    /// Take a HAL FDCAN instance in configuration mode and set its bit timing.
    ///
    /// Frames that match no installed filter are rejected, as are remote frames.
    pub fn new(mut can: FdCan<I, ConfigMode>, timing: NominalBitTiming) -> Self {
        can.set_protocol_exception_handling(false);
        can.set_nominal_bit_timing(timing);
        can.set_frame_transmit(FrameTransmissionConfig::AllowFdCan);
        can.set_global_filter(GlobalFilter {
            handle_standard_frames: NonMatchingFilter::Reject,
            handle_extended_frames: NonMatchingFilter::Reject,
            reject_remote_standard_frames: true,
            reject_remote_extended_frames: true,
        });
        Self { can, next_slot: 0 }
    }

    /// Leave configuration mode and join the bus.
    pub fn start(self) -> FdCanBus<I, NormalOperationMode> {
        FdCanBus {
            can: self.can.into_normal(),
            next_slot: self.next_slot,
        }
    }

    /// Route every extended id to fifo 0. Fallback when the node filters cannot be installed.
    pub fn accept_all(&mut self) {
        self.can.set_extended_filter(
            ExtendedFilterSlot::_0,
            ExtendedFilter {
                filter: FdFilterType::BitMask { filter: 0, mask: 0 },
                action: Action::StoreInFifo0,
            },
        );
        self.next_slot = 1;
    }
}

impl<I: Instance> FdCanBus<I, NormalOperationMode> {
    /// Non-blocking receive from fifo 0. Standard-id frames are dropped.
    pub fn receive(&mut self) -> Option<Received> {
        let mut buf = [0u8; MAX_PAYLOAD];
        let info = match self.can.receive0(&mut buf) {
            Ok(ReceiveOverrun::NoOverrun(info)) => info,
            Ok(ReceiveOverrun::Overrun(info)) => {
                warn!("can rx fifo overrun");
                info
            }
            Err(nb::Error::WouldBlock) => return None,
            Err(nb::Error::Other(e)) => match e {},
        };
        let Id::Extended(id) = info.id else {
            return None;
        };
        let len = usize::from(info.len).min(MAX_PAYLOAD);
        Some(Received {
            id: ArbitrationId::from_raw(id.as_raw()),
            data: heapless::Vec::from_slice(&buf[..len]).unwrap_or_default(),
        })
    }
}

fn action_for(config: FilterConfig) -> Action {
    match config {
        FilterConfig::Disabled => Action::Disable,
        FilterConfig::ToFifo0 => Action::StoreInFifo0,
        FilterConfig::ToFifo1 => Action::StoreInFifo1,
        FilterConfig::Reject => Action::Reject,
        FilterConfig::ToFifo0HighPriority => Action::FlagHighPrioAndStoreInFifo0,
        FilterConfig::ToFifo1HighPriority => Action::FlagHighPrioAndStoreInFifo1,
    }
}

/// Extended filter element `index`. The message RAM holds eight per instance.
fn slot(index: u8) -> Option<ExtendedFilterSlot> {
    Some(match index {
        0 => ExtendedFilterSlot::_0,
        1 => ExtendedFilterSlot::_1,
        2 => ExtendedFilterSlot::_2,
        3 => ExtendedFilterSlot::_3,
        4 => ExtendedFilterSlot::_4,
        5 => ExtendedFilterSlot::_5,
        6 => ExtendedFilterSlot::_6,
        7 => ExtendedFilterSlot::_7,
        _ => return None,
    })
}

fn extended(raw: u32) -> Result<ExtendedId, Error> {
    ExtendedId::new(raw & ExtendedId::MAX.as_raw()).ok_or(Error::UnsupportedFilter)
}

impl<I: Instance> CanBus for FdCanBus<I, ConfigMode> {
    fn add_filter(
        &mut self,
        kind: FilterType,
        config: FilterConfig,
        first: u32,
        second: u32,
    ) -> Result<(), Error> {
        let filter = match kind {
            FilterType::Range => FdFilterType::Range {
                from: extended(first)?,
                to: extended(second)?,
            },
            FilterType::Exact => FdFilterType::DedicatedDual(extended(first)?, extended(second)?),
            FilterType::Mask => FdFilterType::BitMask {
                filter: first,
                mask: second,
            },
        };
        let slot = slot(self.next_slot).ok_or(Error::UnsupportedFilter)?;
        self.can.set_extended_filter(
            slot,
            ExtendedFilter {
                filter,
                action: action_for(config),
            },
        );
        self.next_slot += 1;
        Ok(())
    }

    /// The peripheral is not on the bus yet.
    fn send(&mut self, _id: ArbitrationId, _payload: &[u8], _dlc: Dlc) -> Result<(), Error> {
        Err(Error::Bus)
    }
}

impl<I: Instance> CanBus for FdCanBus<I, NormalOperationMode> {
    /// Filters are fixed once the peripheral has started.
    fn add_filter(
        &mut self,
        _kind: FilterType,
        _config: FilterConfig,
        _first: u32,
        _second: u32,
    ) -> Result<(), Error> {
        Err(Error::UnsupportedFilter)
    }

    fn send(&mut self, id: ArbitrationId, payload: &[u8], dlc: Dlc) -> Result<(), Error> {
        let len = dlc.len().max(payload.len());
        if len > MAX_PAYLOAD {
            return Err(Error::PayloadTooLong);
        }
        // Pad up to the next length the DLC can express.
        let mut buf = [0u8; MAX_PAYLOAD];
        buf[..payload.len()].copy_from_slice(payload);
        let len = Dlc::for_len(len).len();
        let header = TxFrameHeader {
            len: len as u8,
            frame_format: FrameFormat::Fdcan,
            id: Id::Extended(ExtendedId::new(id.raw()).ok_or(Error::UnknownId)?),
            bit_rate_switching: false,
            marker: None,
        };
        match block!(self.can.transmit(header, &buf[..len])) {
            Ok(_) => Ok(()),
            Err(e) => match e {},
        }
    }
}
