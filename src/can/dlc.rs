// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! CAN-FD data length codes.
//!
//! Codes 0 to 8 are the byte count itself. Codes 9 to 15 select the FD sizes
//! 12, 16, 20, 24, 32, 48 and 64.

/// Largest payload a single CAN-FD frame carries.
pub const MAX_PAYLOAD: usize = 64;

/// Payload size for every 4-bit code.
const LENGTHS: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 16, 20, 24, 32, 48, 64];

/// Hardware length code. Always in `0..=15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dlc(u8);

impl Dlc {
    /// Wrap a raw code, keeping only the low four bits.
    #[inline]
    pub const fn from_raw(code: u8) -> Self {
        Self(code & 0x0F)
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Payload bytes this code stands for.
    #[inline]
    pub const fn len(self) -> usize {
        LENGTHS[self.0 as usize] as usize
    }

    /// Smallest code whose payload holds `len` bytes. Saturates at 64 bytes.
    pub const fn for_len(len: usize) -> Self {
        let mut code = 0;
        while code < LENGTHS.len() {
            if LENGTHS[code] as usize >= len {
                return Self(code as u8);
            }
            code += 1;
        }
        Self(15)
    }
}

/// Byte count for a raw code. Codes outside the 4-bit table decode to the maximum length.
#[inline]
pub const fn dlc_to_length(code: u8) -> usize {
    if code as usize >= LENGTHS.len() {
        MAX_PAYLOAD
    } else {
        LENGTHS[code as usize] as usize
    }
}

/// Raw code for a byte count, rounding up to the next defined size.
#[inline]
pub const fn length_to_dlc(len: usize) -> u8 {
    Dlc::for_len(len).raw()
}
