// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial Peripheral Interface (SPI) abstraction layer.
//!
//! - `SpiBus` wraps an enabled HAL SPI instance with 8-bit words.
//! - `ChipSelect` is an active-low GPIO output wrapper for manual CS control.
//! - `Tmc2130Spi` frames TMC2130 register datagrams over a bus and chip select.

use embedded_hal::blocking::spi::Transfer;
use stm32h7xx_hal::{
    gpio::{Output, Pin, PinState, PushPull},
    spi::{self, Enabled, Spi},
};

use crate::drivers::tmc2130::{decode_datagram, encode_datagram, RegisterAccess};

/// Wrapper around an enabled HAL SPI instance (8-bit words).
pub struct SpiBus<I> {
    spi: Spi<I, Enabled, u8>,
}

impl<I> SpiBus<I>
where
    Spi<I, Enabled, u8>: Transfer<u8, Error = spi::Error>,
{
    pub fn new(spi: Spi<I, Enabled, u8>) -> Self {
        Self { spi }
    }

    /// Transfer a byte buffer in-place.
    pub fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), spi::Error> {
        self.spi.transfer(buf)?;
        Ok(())
    }

    pub fn free(self) -> Spi<I, Enabled, u8> {
        self.spi
    }
}

/// Manual chip-select line, active-low, generic over any GPIO pin.
pub struct ChipSelect<const P: char, const N: u8> {
    pin: Pin<P, N, Output<PushPull>>,
}

impl<const P: char, const N: u8> ChipSelect<P, N> {
    /// Create an active-low chip select and set to the inactive state (i.e., high).
    pub fn active_low(mut pin: Pin<P, N, Output<PushPull>>) -> Self {
        pin.set_state(PinState::High);
        Self { pin }
    }

    #[inline]
    pub fn select(&mut self) {
        self.pin.set_low();
    }

    #[inline]
    pub fn deselect(&mut self) {
        self.pin.set_high();
    }
}

/// TMC2130 register transport over SPI.
pub struct Tmc2130Spi<I, const CP: char, const CN: u8> {
    bus: SpiBus<I>,
    cs: ChipSelect<CP, CN>,
}

impl<I, const CP: char, const CN: u8> Tmc2130Spi<I, CP, CN>
where
    Spi<I, Enabled, u8>: Transfer<u8, Error = spi::Error>,
{
    pub fn new(bus: SpiBus<I>, cs: ChipSelect<CP, CN>) -> Self {
        Self { bus, cs }
    }

    /// One chip-select framed datagram. Returns what the chip shifted out.
    fn exchange(&mut self, mut datagram: [u8; 5]) -> Result<[u8; 5], spi::Error> {
        self.cs.select();
        let res = self.bus.transfer_in_place(&mut datagram);
        self.cs.deselect();
        res.map(|()| datagram)
    }
}

impl<I, const CP: char, const CN: u8> RegisterAccess for Tmc2130Spi<I, CP, CN>
where
    Spi<I, Enabled, u8>: Transfer<u8, Error = spi::Error>,
{
    type Error = spi::Error;

    fn write_register(&mut self, addr: u8, data: u32) -> Result<(), Self::Error> {
        self.exchange(encode_datagram(addr, data, true)).map(|_| ())
    }

    fn read_register(&mut self, addr: u8) -> Result<u32, Self::Error> {
        // The reply to a read arrives with the following datagram.
        self.exchange(encode_datagram(addr, 0, false))?;
        let (_status, data) = decode_datagram(self.exchange(encode_datagram(addr, 0, false))?);
        Ok(data)
    }
}
